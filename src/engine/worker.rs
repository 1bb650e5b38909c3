//! Worker process controller
//!
//! Runs one external worker per batch: the job payload goes to the worker's
//! stdin, events come back on stdout one JSON line at a time and are handed to
//! the caller as they arrive. Stderr is logged and only its tail is kept.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{ClipBatchError, ClipBatchResult, RunOutcome};
use crate::job::JobConfiguration;
use crate::protocol::{decode, WorkerEvent};

/// Stderr lines kept for the failure report
const STDERR_TAIL_LINES: usize = 20;
/// How long to wait for stderr to drain after the worker exited
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);
/// How long to wait for a killed worker to be reaped
const KILL_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved worker executable and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ControllerState {
    pub fn is_active(&self) -> bool {
        matches!(self, ControllerState::Starting | ControllerState::Running)
    }
}

/// Spawns and supervises the worker process
///
/// Cheap to clone; clones share state so one handle can `cancel()` while
/// another is inside `run()`.
#[derive(Clone)]
pub struct WorkerController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: Mutex<ControllerState>,
    cancel: watch::Sender<bool>,
}

impl Default for WorkerController {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerController {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(ControllerState::Idle),
                cancel,
            }),
        }
    }

    pub fn state(&self) -> ControllerState {
        *self.lock_state()
    }

    /// Run the worker to completion, delivering each decoded event in order
    ///
    /// Resolves with `Cancelled` once `cancel()` was called; no event is
    /// delivered after that. A worker that cannot be started is an error,
    /// a worker that exits non-zero is a `WorkerFailed` outcome.
    pub async fn run<F>(
        &self,
        command: &WorkerCommand,
        job: &JobConfiguration,
        mut on_event: F,
    ) -> ClipBatchResult<RunOutcome>
    where
        F: FnMut(WorkerEvent) + Send,
    {
        let payload = job.to_json()?;

        let mut cancel_rx = {
            let mut state = self.lock_state();
            if state.is_active() {
                return Err(ClipBatchError::AlreadyRunning);
            }
            *state = ControllerState::Starting;
            self.inner.cancel.send_replace(false);
            self.inner.cancel.subscribe()
        };

        let result = self.supervise(command, payload, &mut cancel_rx, &mut on_event).await;

        let final_state = match &result {
            Ok(RunOutcome::Completed) => ControllerState::Completed,
            Ok(RunOutcome::Cancelled) => ControllerState::Cancelled,
            Ok(RunOutcome::WorkerFailed { .. }) | Err(_) => ControllerState::Failed,
        };
        *self.lock_state() = final_state;
        result
    }

    /// Kill the worker if one is starting or running
    ///
    /// Returns whether there was anything to cancel.
    pub fn cancel(&self) -> bool {
        let state = self.lock_state();
        if !state.is_active() {
            return false;
        }
        info!("Cancelling worker");
        self.inner.cancel.send_replace(true);
        true
    }

    async fn supervise<F>(
        &self,
        command: &WorkerCommand,
        payload: Vec<u8>,
        cancel_rx: &mut watch::Receiver<bool>,
        on_event: &mut F,
    ) -> ClipBatchResult<RunOutcome>
    where
        F: FnMut(WorkerEvent) + Send,
    {
        if *cancel_rx.borrow() {
            return Ok(RunOutcome::Cancelled);
        }

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClipBatchError::Launch {
                program: command.program.clone(),
                source,
            })?;

        info!(program = %command.program, pid = ?child.id(), "Worker started");
        *self.lock_state() = ControllerState::Running;

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "clipbatch::worker::stderr", "{}", line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail)
            })
        });

        if let Some(mut stdin) = child.stdin.take() {
            tokio::select! {
                biased;
                _ = cancelled(cancel_rx) => {
                    return Ok(abort(child, stderr_task).await);
                }
                written = stdin.write_all(&payload) => {
                    if let Err(e) = written {
                        warn!(error = %e, "Worker did not accept the job payload");
                    }
                }
            }
            // Closing stdin tells the worker the payload is complete
            drop(stdin);
        }

        let stdout = child.stdout.take().ok_or_else(|| {
            ClipBatchError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "worker stdout was not captured",
            ))
        })?;
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            tokio::select! {
                biased;
                _ = cancelled(cancel_rx) => {
                    return Ok(abort(child, stderr_task).await);
                }
                read = reader.read_until(b'\n', &mut buf) => {
                    match read {
                        Ok(0) => break,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf);
                            match decode(&line) {
                                Some(event) => {
                                    if *cancel_rx.borrow() {
                                        return Ok(abort(child, stderr_task).await);
                                    }
                                    trace!(event = event.name(), "Worker event");
                                    on_event(event);
                                }
                                None => {
                                    let text = line.trim();
                                    if !text.is_empty() {
                                        trace!(line = %text, "Skipping non-event output");
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed reading worker output");
                            break;
                        }
                    }
                }
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancelled(cancel_rx) => {
                return Ok(abort(child, stderr_task).await);
            }
            status = child.wait() => status?,
        };

        let stderr_tail = match stderr_task {
            Some(task) => match tokio::time::timeout(STDERR_DRAIN_TIMEOUT, task).await {
                Ok(Ok(tail)) => tail,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        if status.success() {
            info!("Worker finished");
            Ok(RunOutcome::Completed)
        } else {
            warn!(code = ?status.code(), "Worker exited with failure");
            Ok(RunOutcome::WorkerFailed {
                code: status.code(),
                stderr_tail,
            })
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resolves once the cancel flag is set
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: cancellation can no longer happen
            std::future::pending::<()>().await;
        }
    }
}

/// Kill the worker and drop whatever it still had to say
async fn abort(mut child: Child, stderr_task: Option<JoinHandle<Vec<String>>>) -> RunOutcome {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Worker already gone");
    }
    if tokio::time::timeout(KILL_WAIT_TIMEOUT, child.wait()).await.is_err() {
        warn!("Killed worker was not reaped in time");
    }
    if let Some(task) = stderr_task {
        task.abort();
    }
    info!("Worker cancelled");
    RunOutcome::Cancelled
}
