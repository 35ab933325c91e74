//! Worker group - a fixed pool of tokio tasks draining a bounded queue.
//!
//! - `submit` waits for room in the queue, `try_submit` rejects when full
//! - every accepted run is registered on the `StatusBoard` before it is queued
//! - `request_shutdown` stops workers from taking new runs; in-flight runs are
//!   never cancelled

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::pipeline::TaskPipeline;
use crate::app::status::{RunCounts, StatusBoard};
use crate::domain::{RunId, TaskDescriptor};
use crate::ports::IdGenerator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("queue is full")]
    QueueFull,

    #[error("worker group is shut down")]
    Closed,
}

/// Where intake hands accepted tasks.
#[async_trait]
pub trait TaskSubmitter: Send + Sync {
    /// Wait for room in the queue.
    async fn submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError>;

    /// Fail with `QueueFull` instead of waiting.
    fn try_submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError>;
}

struct Submission {
    run_id: RunId,
    task: TaskDescriptor,
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Submission>>>;

pub struct WorkerGroup {
    sender: mpsc::Sender<Submission>,
    receiver: SharedReceiver,
    shutdown_tx: watch::Sender<bool>,
    joins: Mutex<Vec<JoinHandle<()>>>,
    ids: Arc<dyn IdGenerator>,
    board: Arc<StatusBoard>,
}

impl WorkerGroup {
    /// Spawn `n` workers sharing a queue of `capacity` pending runs.
    pub fn spawn(
        n: usize,
        capacity: usize,
        pipeline: Arc<TaskPipeline>,
        ids: Arc<dyn IdGenerator>,
        board: Arc<StatusBoard>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let joins: Vec<JoinHandle<()>> = (0..n)
            .map(|worker_id| {
                let rx = Arc::clone(&receiver);
                let pipeline = Arc::clone(&pipeline);
                let board = Arc::clone(&board);
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(worker_loop(worker_id, rx, pipeline, board, shutdown_rx))
            })
            .collect();
        info!(workers = n, capacity, "worker group started");

        Self {
            sender,
            receiver,
            shutdown_tx,
            joins: Mutex::new(joins),
            ids,
            board,
        }
    }

    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn counts(&self) -> RunCounts {
        self.board.counts()
    }

    /// Stop taking new runs. Queued runs stay queued.
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Shut down and wait for in-flight runs to finish. Runs still queued
    /// are dropped from the board.
    pub async fn shutdown_and_join(&self) {
        self.request_shutdown();
        let joins = std::mem::take(&mut *self.joins.lock().unwrap_or_else(|p| p.into_inner()));
        for join in joins {
            if let Err(e) = join.await {
                warn!("worker ended abnormally: {e}");
            }
        }

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        while let Ok(Submission { run_id, task }) = receiver.try_recv() {
            warn!(run_id = %run_id, task = %task.task_id, "queued run dropped at shutdown");
            self.board.discard(run_id);
        }
        info!(counts = ?self.board.counts(), "worker group stopped");
    }

    fn register(&self, task: TaskDescriptor) -> Result<Submission, SubmitError> {
        if *self.shutdown_tx.borrow() {
            return Err(SubmitError::Closed);
        }
        let run_id = self.ids.generate_run_id();
        self.board.queued(run_id, task.task_id.clone(), task.round);
        Ok(Submission { run_id, task })
    }
}

#[async_trait]
impl TaskSubmitter for WorkerGroup {
    async fn submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError> {
        let submission = self.register(task)?;
        let run_id = submission.run_id;
        if self.sender.send(submission).await.is_err() {
            self.board.discard(run_id);
            return Err(SubmitError::Closed);
        }
        debug!(run_id = %run_id, "run queued");
        Ok(run_id)
    }

    fn try_submit(&self, task: TaskDescriptor) -> Result<RunId, SubmitError> {
        let submission = self.register(task)?;
        let run_id = submission.run_id;
        match self.sender.try_send(submission) {
            Ok(()) => {
                debug!(run_id = %run_id, "run queued");
                Ok(run_id)
            }
            Err(TrySendError::Full(_)) => {
                self.board.discard(run_id);
                Err(SubmitError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.board.discard(run_id);
                Err(SubmitError::Closed)
            }
        }
    }
}

async fn next_submission(receiver: &SharedReceiver) -> Option<Submission> {
    receiver.lock().await.recv().await
}

async fn worker_loop(
    worker_id: usize,
    receiver: SharedReceiver,
    pipeline: Arc<TaskPipeline>,
    board: Arc<StatusBoard>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            next = next_submission(&receiver) => next,
        };

        // every sender is gone
        let Some(Submission { run_id, task }) = next else {
            break;
        };

        debug!(worker_id, run_id = %run_id, "run picked up");
        board.running(run_id);
        let report = pipeline.run(run_id, &task).await;
        board.finished(report);
    }
    debug!(worker_id, "worker stopped");
}
