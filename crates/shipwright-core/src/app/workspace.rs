//! Workspace manager - one isolated directory per run.
//!
//! Directory names are `<task-slug>-<ULID>` and are created with `create_dir`
//! (never `create_dir_all` on the leaf), so two runs can never end up sharing a
//! path even for the same task id. The `Workspace` guard removes the directory
//! when dropped, on success, abort and unwinding alike, unless retention is on.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{PipelineError, TaskDescriptor, decode_data_uri};
use crate::ports::IdGenerator;

pub struct WorkspaceManager {
    root: PathBuf,
    retain: bool,
    ids: Arc<dyn IdGenerator>,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>, retain: bool, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            root: root.into(),
            retain,
            ids,
        }
    }

    /// Create the directory and write every attachment into it.
    ///
    /// On a decode error the partially written directory is removed (unless
    /// retained) before the error is returned.
    pub async fn materialize(&self, task: &TaskDescriptor) -> Result<Workspace, PipelineError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PipelineError::Workspace(format!("{}: {e}", self.root.display())))?;

        let id = self.ids.generate_workspace_id();
        let path = self.root.join(format!("{}-{}", task.slug(), id.as_ulid()));
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| PipelineError::Workspace(format!("{}: {e}", path.display())))?;
        debug!(workspace = %path.display(), task = %task.task_id, "workspace created");

        let workspace = Workspace {
            path,
            retain: self.retain,
        };

        let mut seen = HashSet::new();
        for attachment in &task.attachments {
            let file = attachment_path(&attachment.name)?;
            if !seen.insert(attachment.name.as_str()) {
                return Err(PipelineError::Decode {
                    name: attachment.name.clone(),
                    reason: "duplicate attachment name".to_string(),
                });
            }
            let decoded = decode_data_uri(&attachment.name, &attachment.url)?;
            workspace.write_bytes(file, &decoded.bytes).await?;
            debug!(
                attachment = %attachment.name,
                media_type = %decoded.media_type,
                bytes = decoded.bytes.len(),
                "attachment written"
            );
        }

        Ok(workspace)
    }
}

/// Attachment names become file names; anything that could escape the
/// workspace is a decode error.
fn attachment_path(name: &str) -> Result<&Path, PipelineError> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(PipelineError::Decode {
            name: name.to_string(),
            reason: "attachment name must be a plain file name".to_string(),
        }),
    }
}

/// Scoped ownership of one run's directory.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    retain: bool,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_text(&self, relative: &str, content: &str) -> Result<(), PipelineError> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::Build(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| PipelineError::Build(format!("{}: {e}", target.display())))
    }

    async fn write_bytes(&self, file: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        let target = self.path.join(file);
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| PipelineError::Workspace(format!("{}: {e}", target.display())))
    }

    /// Relative paths only, no `..`.
    fn resolve(&self, relative: &str) -> Result<PathBuf, PipelineError> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(PipelineError::Build(format!(
                "refusing to write outside the workspace: {relative}"
            )));
        }
        Ok(self.path.join(rel))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.retain {
            debug!(workspace = %self.path.display(), "workspace retained");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(workspace = %self.path.display(), "failed to remove workspace: {e}");
        }
    }
}
