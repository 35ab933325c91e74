//! Intake gate - validates a submission against the secret store and queues it.
//!
//! Only errors raised here ever reach the caller; everything after the
//! `RunId` is handed back is reported through logs and the status board.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::app::runtime::{SubmitError, TaskSubmitter};
use crate::domain::{Attachment, RunId, TaskDescriptor};
use crate::ports::{SecretStore, SecretStoreError};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid secret")]
    InvalidSecret,

    #[error("queue is full, retry later")]
    Busy,

    #[error("not accepting tasks")]
    Closed,

    #[error("need email & secret")]
    IncompleteUpdate,

    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

impl From<SubmitError> for IntakeError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::QueueFull => IntakeError::Busy,
            SubmitError::Closed => IntakeError::Closed,
        }
    }
}

/// Body of a task submission. Every field except `attachments` is required.
/// `email` and `secret` must also be non-empty; the rest only have to be
/// present, so an empty brief or nonce is a valid submission.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntakeRequest {
    pub email: String,
    pub secret: String,
    pub task: Option<String>,
    pub round: Option<u32>,
    pub nonce: Option<String>,
    pub brief: Option<String>,
    pub evaluation_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl fmt::Debug for IntakeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakeRequest")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("task", &self.task)
            .field("round", &self.round)
            .field("nonce", &self.nonce)
            .field("evaluation_url", &self.evaluation_url)
            .field("attachments", &self.attachments.len())
            .finish()
    }
}

impl IntakeRequest {
    fn into_task(self) -> Result<(String, TaskDescriptor), IntakeError> {
        if self.email.trim().is_empty() {
            return Err(IntakeError::MissingField("email"));
        }
        if self.secret.is_empty() {
            return Err(IntakeError::MissingField("secret"));
        }
        let task_id = self.task.ok_or(IntakeError::MissingField("task"))?;
        let round = self.round.ok_or(IntakeError::MissingField("round"))?;
        let nonce = self.nonce.ok_or(IntakeError::MissingField("nonce"))?;
        let brief = self.brief.ok_or(IntakeError::MissingField("brief"))?;
        let callback_url = self
            .evaluation_url
            .ok_or(IntakeError::MissingField("evaluation_url"))?;

        let task = TaskDescriptor {
            email: self.email,
            task_id,
            round,
            nonce,
            brief,
            attachments: self.attachments,
            callback_url,
        };
        Ok((self.secret, task))
    }
}

/// Body of the administrative secret update.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminUpdate {
    pub email: String,
    pub secret: String,
}

pub struct Intake {
    secrets: Arc<dyn SecretStore>,
    submitter: Arc<dyn TaskSubmitter>,
}

impl Intake {
    pub fn new(secrets: Arc<dyn SecretStore>, submitter: Arc<dyn TaskSubmitter>) -> Self {
        Self { secrets, submitter }
    }

    /// Validate and queue. Never waits for room: a full queue is `Busy`.
    pub fn accept(&self, request: IntakeRequest) -> Result<RunId, IntakeError> {
        let (secret, task) = request.into_task()?;

        if self.secrets.get(&task.email).as_deref() != Some(secret.as_str()) {
            warn!(email = %task.email, task = %task.task_id, "rejected submission: invalid secret");
            return Err(IntakeError::InvalidSecret);
        }

        let task_id = task.task_id.clone();
        let round = task.round;
        let run_id = self.submitter.try_submit(task).inspect_err(|e| {
            warn!(task = %task_id, "submission not queued: {e}");
        })?;
        info!(run_id = %run_id, task = %task_id, round, "submission accepted");
        Ok(run_id)
    }

    /// Overwrite the secret for `email` and persist the whole mapping.
    pub fn update_secret(&self, update: AdminUpdate) -> Result<(), IntakeError> {
        if update.email.trim().is_empty() || update.secret.is_empty() {
            return Err(IntakeError::IncompleteUpdate);
        }
        self.secrets.set(&update.email, &update.secret)?;
        info!(email = %update.email, "secret updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{FileSecretStore, InMemorySecretStore};
    use crate::testing::task_with_attachments;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;
    use ulid::Ulid;

    #[derive(Default)]
    struct RecordingSubmitter {
        full: bool,
        tasks: Mutex<Vec<TaskDescriptor>>,
    }

    impl RecordingSubmitter {
        fn count(&self) -> usize {
            self.tasks.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TaskSubmitter for RecordingSubmitter {
        async fn submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError> {
            self.try_submit(task)
        }

        fn try_submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError> {
            if self.full {
                return Err(SubmitError::QueueFull);
            }
            self.tasks.lock().unwrap().push(task);
            Ok(RunId::from_ulid(Ulid::new()))
        }
    }

    fn request(secret: &str) -> IntakeRequest {
        let task = task_with_attachments(1);
        IntakeRequest {
            email: task.email,
            secret: secret.to_string(),
            task: Some(task.task_id),
            round: Some(task.round),
            nonce: Some(task.nonce),
            brief: Some(task.brief),
            evaluation_url: Some(task.callback_url),
            attachments: task.attachments,
        }
    }

    fn intake(store: Arc<dyn SecretStore>) -> (Intake, Arc<RecordingSubmitter>) {
        let submitter = Arc::new(RecordingSubmitter::default());
        (Intake::new(store, submitter.clone()), submitter)
    }

    fn store() -> Arc<dyn SecretStore> {
        Arc::new(InMemorySecretStore::new().with_secret("student@example.com", "s3cret"))
    }

    #[test]
    fn valid_submission_is_queued_as_a_task() {
        let (intake, submitter) = intake(store());

        intake.accept(request("s3cret")).unwrap();

        let tasks = submitter.tasks.lock().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id, "captcha-solver");
        assert_eq!(tasks[0].callback_url, "https://eval.example.com/notify");
        assert_eq!(tasks[0].attachments.len(), 1);
    }

    #[rstest]
    #[case::wrong("nope")]
    #[case::different_case("S3CRET")]
    fn wrong_secret_is_rejected(#[case] secret: &str) {
        let (intake, submitter) = intake(store());

        let err = intake.accept(request(secret)).unwrap_err();

        assert!(matches!(err, IntakeError::InvalidSecret));
        assert_eq!(submitter.count(), 0);
    }

    #[test]
    fn unknown_email_is_rejected() {
        let (intake, _) = intake(store());
        let mut req = request("s3cret");
        req.email = "someone@else.com".to_string();

        assert!(matches!(intake.accept(req), Err(IntakeError::InvalidSecret)));
    }

    #[rstest]
    #[case::email("email")]
    #[case::secret("secret")]
    #[case::task("task")]
    #[case::nonce("nonce")]
    #[case::brief("brief")]
    #[case::evaluation_url("evaluation_url")]
    #[case::round("round")]
    fn missing_fields_are_named(#[case] field: &str) {
        let (intake, _) = intake(store());
        let mut req = request("s3cret");
        match field {
            "email" => req.email.clear(),
            "secret" => req.secret.clear(),
            "task" => req.task = None,
            "nonce" => req.nonce = None,
            "brief" => req.brief = None,
            "evaluation_url" => req.evaluation_url = None,
            _ => req.round = None,
        }

        let err = intake.accept(req).unwrap_err();
        assert_eq!(err.to_string(), format!("missing {field}"));
    }

    #[test]
    fn present_but_empty_brief_and_nonce_are_accepted() {
        let (intake, submitter) = intake(store());
        let req: IntakeRequest = serde_json::from_value(serde_json::json!({
            "email": "student@example.com",
            "secret": "s3cret",
            "task": "captcha-solver",
            "round": 2,
            "nonce": "",
            "brief": "",
            "evaluation_url": "https://eval.example.com/notify"
        }))
        .unwrap();

        intake.accept(req).unwrap();

        let tasks = submitter.tasks.lock().unwrap();
        assert_eq!(tasks[0].nonce, "");
        assert_eq!(tasks[0].brief, "");
        assert_eq!(tasks[0].round, 2);
        assert!(tasks[0].attachments.is_empty());
    }

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let req: IntakeRequest = serde_json::from_value(serde_json::json!({
            "email": "student@example.com",
            "secret": "s3cret"
        }))
        .unwrap();
        let (intake, _) = intake(store());

        assert!(matches!(
            intake.accept(req),
            Err(IntakeError::MissingField("task"))
        ));
    }

    #[test]
    fn full_queue_is_busy() {
        let submitter = Arc::new(RecordingSubmitter {
            full: true,
            ..RecordingSubmitter::default()
        });
        let intake = Intake::new(store(), submitter);

        assert!(matches!(intake.accept(request("s3cret")), Err(IntakeError::Busy)));
    }

    #[test]
    fn admin_update_replaces_the_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let store = Arc::new(FileSecretStore::open(&path).unwrap());
        store.set("student@example.com", "old").unwrap();
        let (intake, submitter) = intake(store);

        intake
            .update_secret(AdminUpdate {
                email: "student@example.com".to_string(),
                secret: "new".to_string(),
            })
            .unwrap();

        assert!(matches!(
            intake.accept(request("old")),
            Err(IntakeError::InvalidSecret)
        ));
        intake.accept(request("new")).unwrap();
        assert_eq!(submitter.count(), 1);

        let reloaded = FileSecretStore::open(&path).unwrap();
        assert_eq!(reloaded.get("student@example.com").as_deref(), Some("new"));
    }

    #[test]
    fn incomplete_admin_update_is_rejected() {
        let (intake, _) = intake(store());

        let err = intake
            .update_secret(AdminUpdate {
                email: "student@example.com".to_string(),
                secret: String::new(),
            })
            .unwrap_err();

        assert!(matches!(err, IntakeError::IncompleteUpdate));
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let rendered = format!("{:?}", request("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
