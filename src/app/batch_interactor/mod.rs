// Batch interactor - Runs one "process" action end to end

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{BatchCounts, BatchStatus, FileProgress, FileStatus};
use crate::engine::progress::ProgressTracker;
use crate::engine::worker::{WorkerCommand, WorkerController};
use crate::error::{ClipBatchError, ClipBatchResult, RunOutcome};
use crate::job::JobConfiguration;

/// Final report of a batch
///
/// Keeps the process outcome and the per-file outcomes side by side: a worker
/// can report every file as done and still exit non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub status: BatchStatus,
    pub outcome: RunOutcome,
    pub files: Vec<FileProgress>,
    /// Counts from the worker's `complete` event
    pub reported: Option<BatchCounts>,
    pub elapsed: Duration,
    /// Cancelled because the deadline expired
    pub timed_out: bool,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.status == FileStatus::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Error(_)))
            .count()
    }

    /// Every file completed and the worker exited cleanly
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Completed { failed: 0, .. })
            && self.outcome.is_success()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.outcome) {
            (BatchStatus::Completed { successful, failed }, _) => {
                write!(f, "{} succeeded / {} failed", successful, failed)
            }
            (BatchStatus::Cancelled, _) => {
                let reason = if self.timed_out { "deadline reached" } else { "cancelled" };
                write!(f, "{}: {} file(s) completed before stopping", reason, self.succeeded())
            }
            (BatchStatus::Error { message }, RunOutcome::WorkerFailed { .. }) => write!(
                f,
                "worker failed ({}); files reported {} succeeded / {} failed",
                message,
                self.succeeded(),
                self.failed()
            ),
            (BatchStatus::Error { message }, _) => write!(
                f,
                "error: {}; files reported {} succeeded / {} failed",
                message,
                self.succeeded(),
                self.failed()
            ),
            (status, _) => write!(f, "{}", status),
        }
    }
}

/// Interactor for the batch processing use case
pub struct BatchInteractor {
    controller: WorkerController,
    tracker: ProgressTracker,
    deadline: Option<Duration>,
    /// Set for the whole of `process`, before the tracker is touched
    claimed: AtomicBool,
}

/// Releases the interactor's claim when `process` returns
struct RunClaim<'a>(&'a AtomicBool);

impl Drop for RunClaim<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BatchInteractor {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self {
            controller: WorkerController::new(),
            tracker,
            deadline: None,
            claimed: AtomicBool::new(false),
        }
    }

    /// Cancel the worker when a run takes longer than `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Handle that can cancel a run from another task
    pub fn controller(&self) -> WorkerController {
        self.controller.clone()
    }

    pub fn is_running(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
            || self.controller.state().is_active()
            || self.tracker.is_running()
    }

    pub fn cancel(&self) -> bool {
        self.controller.cancel()
    }

    /// Clear progress state, e.g. after the file list was cleared
    pub fn reset(&self) -> Result<(), DomainError> {
        if self.is_running() {
            return Err(DomainError::Busy("cannot reset while a batch is running".to_string()));
        }
        self.tracker.reset();
        Ok(())
    }

    /// Run the worker for `job` and settle the batch status
    pub async fn process(
        &self,
        command: &WorkerCommand,
        job: &JobConfiguration,
    ) -> ClipBatchResult<BatchSummary> {
        if self.controller.state().is_active() || self.tracker.is_running() {
            return Err(ClipBatchError::AlreadyRunning);
        }
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClipBatchError::AlreadyRunning);
        }
        let _claim = RunClaim(&self.claimed);

        info!(
            operation = %job.operation(),
            files = job.files().len(),
            program = %command.program,
            "Starting batch"
        );
        let started = Instant::now();
        self.tracker.begin(job.files());

        let tracker = self.tracker.clone();
        let run = self.controller.run(command, job, move |event| tracker.apply(&event));
        tokio::pin!(run);

        let mut timed_out = false;
        let result = match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    result = &mut run => result,
                    _ = tokio::time::sleep(deadline) => {
                        warn!(deadline_secs = deadline.as_secs_f64(), "Batch deadline reached, cancelling");
                        timed_out = self.controller.cancel();
                        run.await
                    }
                }
            }
            None => run.await,
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.tracker.fail(e.to_string());
                return Err(e);
            }
        };

        let status = self.tracker.finish(&outcome);
        let snapshot = self.tracker.snapshot();
        let summary = BatchSummary {
            status,
            outcome,
            files: snapshot.files,
            reported: snapshot.reported,
            elapsed: started.elapsed(),
            timed_out,
        };

        info!(summary = %summary, "Batch finished");
        Ok(summary)
    }
}
