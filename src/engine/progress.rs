//! Progress tracking and observer system for UI integration
//!
//! [`ProgressTracker`] projects decoded worker events onto one
//! [`FileProgress`] per file plus an aggregate [`BatchStatus`]. It is a
//! last-write-wins projector, not a sequencer: out-of-order events still apply
//! their transition. State sits behind a mutex so event delivery, cancellation
//! and readers on other tasks never race on the same entry.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::model::{BatchCounts, BatchStatus, FileProgress, FileStatus, MediaFileRef};
use crate::error::RunOutcome;
use crate::protocol::WorkerEvent;

/// Observer trait for UI integration
pub trait ProgressObserver: Send + Sync {
    /// Called when a batch starts, with every file in pending state
    fn on_batch_start(&self, files: &[FileProgress]);

    /// Called after an event changed a file's progress
    fn on_file_changed(&self, progress: &FileProgress);

    /// Called when the aggregate status changes
    fn on_status_changed(&self, status: &BatchStatus);

    /// Called on `progress` events
    fn on_overall_progress(&self, _progress: &OverallProgress) {}
}

/// Position reported by the worker's `progress` events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallProgress {
    pub current_file: u32,
    pub total_files: u32,
    pub filename: String,
}

/// Point-in-time copy of the tracker state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    pub status: BatchStatus,
    pub files: Vec<FileProgress>,
    pub total_files: u32,
    pub hardware_acceleration: bool,
    pub overall: Option<OverallProgress>,
    /// Counts from the worker's `complete` event, if one arrived
    pub reported: Option<BatchCounts>,
}

/// Batch progress tracker with thread-safe updates
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<TrackerInner>>,
    observers: Arc<Mutex<Vec<Arc<dyn ProgressObserver>>>>,
}

struct TrackerInner {
    files: Vec<FileProgress>,
    status: BatchStatus,
    total_files: u32,
    hardware_acceleration: bool,
    overall: Option<OverallProgress>,
    reported: Option<BatchCounts>,
}

impl TrackerInner {
    fn idle() -> Self {
        Self {
            files: Vec::new(),
            status: BatchStatus::Idle,
            total_files: 0,
            hardware_acceleration: false,
            overall: None,
            reported: None,
        }
    }

    fn file_mut(&mut self, id: &str) -> Option<&mut FileProgress> {
        self.files.iter_mut().find(|file| file.id == id)
    }

    fn derived_counts(&self) -> BatchCounts {
        let successful = self
            .files
            .iter()
            .filter(|file| file.status == FileStatus::Completed)
            .count() as u32;
        BatchCounts {
            successful,
            failed: self.files.len() as u32 - successful,
        }
    }
}

/// What an update changed, collected under the lock and notified after it
#[derive(Default)]
struct Changes {
    file: Option<FileProgress>,
    status: Option<BatchStatus>,
    overall: Option<OverallProgress>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create an idle tracker
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner::idle())),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a progress observer
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(observer);
        }
    }

    /// Start a batch: one pending entry per file, status `running`
    pub fn begin(&self, files: &[MediaFileRef]) {
        let pending: Vec<FileProgress> = files.iter().map(|file| FileProgress::pending(&file.id)).collect();
        {
            let mut inner = self.lock();
            *inner = TrackerInner::idle();
            inner.files = pending.clone();
            inner.total_files = files.len() as u32;
            inner.status = BatchStatus::Running;
        }

        self.notify_observers(|observer| observer.on_batch_start(&pending));
        self.notify_observers(|observer| observer.on_status_changed(&BatchStatus::Running));
    }

    /// Apply one decoded worker event
    pub fn apply(&self, event: &WorkerEvent) {
        let changes = {
            let mut inner = self.lock();
            Self::apply_locked(&mut inner, event)
        };
        self.publish(changes);
    }

    fn apply_locked(inner: &mut TrackerInner, event: &WorkerEvent) -> Changes {
        let mut changes = Changes::default();

        match event {
            WorkerEvent::Start {
                total_files,
                hardware_acceleration,
                ffmpeg_path,
            } => {
                debug!(total_files, hardware_acceleration, ffmpeg = ?ffmpeg_path, "Worker started");
                inner.total_files = *total_files;
                inner.hardware_acceleration = *hardware_acceleration;
            }
            WorkerEvent::Progress {
                current_file,
                total_files,
                filename,
            } => {
                let overall = OverallProgress {
                    current_file: *current_file,
                    total_files: *total_files,
                    filename: filename.clone(),
                };
                inner.overall = Some(overall.clone());
                changes.overall = Some(overall);
            }
            WorkerEvent::Complete {
                total_files,
                successful,
                failed,
            } => {
                debug!(total_files, successful, failed, "Worker reported completion");
                let counts = BatchCounts {
                    successful: *successful,
                    failed: *failed,
                };
                inner.reported = Some(counts);
                // A reported error is never downgraded by a later summary
                if !matches!(inner.status, BatchStatus::Error { .. }) {
                    inner.status = BatchStatus::Completed {
                        successful: counts.successful,
                        failed: counts.failed,
                    };
                    changes.status = Some(inner.status.clone());
                }
            }
            WorkerEvent::Error { message } => {
                warn!(message = %message, "Worker reported an error");
                inner.status = BatchStatus::Error { message: message.clone() };
                changes.status = Some(inner.status.clone());
            }
            file_event => {
                let Some(id) = file_event.file_id() else {
                    return changes;
                };
                let Some(file) = inner.file_mut(id) else {
                    debug!(file = %id, event = file_event.name(), "Ignoring event for unknown file");
                    return changes;
                };
                Self::apply_file_event(file, file_event);
                changes.file = Some(file.clone());
            }
        }

        changes
    }

    fn apply_file_event(file: &mut FileProgress, event: &WorkerEvent) {
        match event {
            WorkerEvent::FileStart { .. } => {
                file.status = FileStatus::Processing;
            }
            WorkerEvent::SegmentStart { total, .. } => {
                if *total > 0 {
                    file.segments_total = *total;
                }
            }
            WorkerEvent::SegmentComplete { total, .. } => {
                file.segments_completed += 1;
                if *total > 0 && *total != file.segments_total {
                    file.segments_total = *total;
                }
            }
            WorkerEvent::FileComplete {
                success,
                output_dir,
                segments_completed,
                segments_total,
                output,
                size,
                error,
                ..
            } => {
                // The terminal event's own counters win over the running ones
                if let Some(completed) = segments_completed {
                    file.segments_completed = *completed;
                }
                if let Some(total) = segments_total {
                    file.segments_total = *total;
                }
                if output_dir.is_some() {
                    file.output_dir = output_dir.clone();
                }
                if output.is_some() {
                    file.output_path = output.clone();
                }
                if size.is_some() {
                    file.output_size = size.clone();
                }
                file.status = if *success {
                    FileStatus::Completed
                } else {
                    FileStatus::Error(
                        error
                            .clone()
                            .filter(|message| !message.is_empty())
                            .unwrap_or_else(|| "processing failed".to_string()),
                    )
                };
            }
            WorkerEvent::FileError { error, segment, .. } => {
                let message = if error.is_empty() { "unknown error" } else { error.as_str() };
                file.status = FileStatus::Error(match segment {
                    Some(segment) => format!("segment {}: {}", segment, message),
                    None => message.to_string(),
                });
            }
            _ => {}
        }
    }

    /// Settle the aggregate status once the worker run has resolved
    ///
    /// A non-zero exit always ends in `error`, whatever the files reported. A
    /// clean exit without a `complete` event derives counts from file states.
    pub fn finish(&self, outcome: &RunOutcome) -> BatchStatus {
        if *outcome == RunOutcome::Cancelled {
            return self.mark_cancelled();
        }

        let status = {
            let mut inner = self.lock();
            match outcome {
                RunOutcome::Completed => {
                    if !matches!(inner.status, BatchStatus::Error { .. }) {
                        let counts = match inner.reported {
                            Some(counts) => counts,
                            None => inner.derived_counts(),
                        };
                        inner.status = BatchStatus::Completed {
                            successful: counts.successful,
                            failed: counts.failed,
                        };
                    }
                }
                failed => {
                    let message = failed
                        .failure_message()
                        .unwrap_or_else(|| "worker failed".to_string());
                    inner.status = BatchStatus::Error { message };
                }
            }
            inner.status.clone()
        };

        self.notify_observers(|observer| observer.on_status_changed(&status));
        status
    }

    /// Mark files still processing as `error("cancelled")` and the batch as cancelled
    ///
    /// Completed files keep their state.
    pub fn mark_cancelled(&self) -> BatchStatus {
        let changed = {
            let mut inner = self.lock();
            inner.status = BatchStatus::Cancelled;
            inner
                .files
                .iter_mut()
                .filter(|file| file.status == FileStatus::Processing)
                .map(|file| {
                    file.status = FileStatus::Error("cancelled".to_string());
                    file.clone()
                })
                .collect::<Vec<_>>()
        };

        for file in &changed {
            self.notify_observers(|observer| observer.on_file_changed(file));
        }
        self.notify_observers(|observer| observer.on_status_changed(&BatchStatus::Cancelled));
        BatchStatus::Cancelled
    }

    /// Force the aggregate status to `error`, e.g. when the worker failed to launch
    pub fn fail(&self, message: impl Into<String>) {
        let status = BatchStatus::Error { message: message.into() };
        self.lock().status = status.clone();
        self.notify_observers(|observer| observer.on_status_changed(&status));
    }

    /// Back to idle with no files
    pub fn reset(&self) {
        *self.lock() = TrackerInner::idle();
        self.notify_observers(|observer| observer.on_status_changed(&BatchStatus::Idle));
    }

    pub fn status(&self) -> BatchStatus {
        self.lock().status.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().status.is_running()
    }

    /// Current progress of one file
    pub fn file(&self, id: &str) -> Option<FileProgress> {
        self.lock().files.iter().find(|file| file.id == id).cloned()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let inner = self.lock();
        TrackerSnapshot {
            status: inner.status.clone(),
            files: inner.files.clone(),
            total_files: inner.total_files,
            hardware_acceleration: inner.hardware_acceleration,
            overall: inner.overall.clone(),
            reported: inner.reported,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        // Updates never panic while holding the lock; recover the data if one did
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, changes: Changes) {
        if let Some(file) = &changes.file {
            self.notify_observers(|observer| observer.on_file_changed(file));
        }
        if let Some(overall) = &changes.overall {
            self.notify_observers(|observer| observer.on_overall_progress(overall));
        }
        if let Some(status) = &changes.status {
            self.notify_observers(|observer| observer.on_status_changed(status));
        }
    }

    /// Notify all observers
    fn notify_observers<F>(&self, f: F)
    where
        F: Fn(&dyn ProgressObserver),
    {
        let observers = match self.observers.lock() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };
        for observer in observers.iter() {
            f(observer.as_ref());
        }
    }
}

/// Console observer for CLI usage
pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_batch_start(&self, files: &[FileProgress]) {
        println!("🚀 Processing {} file(s)", files.len());
        if self.verbose {
            for file in files {
                println!("   {}", file.id);
            }
        }
    }

    fn on_file_changed(&self, progress: &FileProgress) {
        match &progress.status {
            FileStatus::Pending => {}
            FileStatus::Processing => {
                if progress.segments_total > 0 {
                    println!(
                        "🔄 {} [{}/{} segments]",
                        progress.id, progress.segments_completed, progress.segments_total
                    );
                } else if self.verbose || progress.segments_completed == 0 {
                    println!("🔄 {}", progress.id);
                }
            }
            FileStatus::Completed => {
                let target = progress
                    .output_path
                    .as_deref()
                    .or(progress.output_dir.as_deref())
                    .unwrap_or("-");
                match &progress.output_size {
                    Some(size) => println!("✅ {} -> {} ({})", progress.id, target, size),
                    None => println!("✅ {} -> {}", progress.id, target),
                }
            }
            FileStatus::Error(message) => println!("❌ {}: {}", progress.id, message),
        }
    }

    fn on_status_changed(&self, status: &BatchStatus) {
        if self.verbose || !matches!(status, BatchStatus::Running | BatchStatus::Idle) {
            println!("Batch {}", status);
        }
    }

    fn on_overall_progress(&self, progress: &OverallProgress) {
        if self.verbose {
            println!(
                "   file {}/{}: {}",
                progress.current_file, progress.total_files, progress.filename
            );
        }
    }
}

/// JSON-lines observer for structured output
pub struct JsonObserver;

impl ProgressObserver for JsonObserver {
    fn on_batch_start(&self, files: &[FileProgress]) {
        let event = serde_json::json!({
            "event": "batch_start",
            "files": files.iter().map(|file| file.id.as_str()).collect::<Vec<_>>(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_file_changed(&self, progress: &FileProgress) {
        let event = serde_json::json!({
            "event": "file",
            "progress": progress,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_status_changed(&self, status: &BatchStatus) {
        let event = serde_json::json!({
            "event": "status",
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_overall_progress(&self, progress: &OverallProgress) {
        let event = serde_json::json!({
            "event": "progress",
            "current_file": progress.current_file,
            "total_files": progress.total_files,
            "filename": progress.filename,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }
}

/// No-op observer for when progress output is disabled
pub struct NoOpObserver;

impl ProgressObserver for NoOpObserver {
    fn on_batch_start(&self, _files: &[FileProgress]) {}
    fn on_file_changed(&self, _progress: &FileProgress) {}
    fn on_status_changed(&self, _status: &BatchStatus) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct TestObserver {
        file_changes: AtomicU64,
        statuses: Mutex<Vec<BatchStatus>>,
    }

    impl TestObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                file_changes: AtomicU64::new(0),
                statuses: Mutex::new(Vec::new()),
            })
        }
    }

    impl ProgressObserver for TestObserver {
        fn on_batch_start(&self, _files: &[FileProgress]) {}

        fn on_file_changed(&self, _progress: &FileProgress) {
            self.file_changes.fetch_add(1, Ordering::Relaxed);
        }

        fn on_status_changed(&self, status: &BatchStatus) {
            self.statuses.lock().unwrap().push(status.clone());
        }
    }

    fn files(names: &[&str]) -> Vec<MediaFileRef> {
        names
            .iter()
            .map(|name| MediaFileRef::from_path(format!("/in/{}", name)).unwrap())
            .collect()
    }

    fn feed(tracker: &ProgressTracker, lines: &[&str]) {
        for line in lines {
            tracker.apply(&decode(line).unwrap());
        }
    }

    #[test]
    fn test_begin_creates_pending_entries() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.status(), BatchStatus::Idle);

        tracker.begin(&files(&["a.mp4", "b.mp4"]));
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.status, BatchStatus::Running);
        assert_eq!(snapshot.files.len(), 2);
        assert!(snapshot.files.iter().all(|file| file.status == FileStatus::Pending));
    }

    #[test]
    fn test_terminal_event_counters_win() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a"]));

        feed(
            &tracker,
            &[
                r#"{"event":"file_start","file":"a","path":"/in/a"}"#,
                r#"{"event":"segment_start","file":"a","segment":1,"total":3}"#,
                r#"{"event":"segment_complete","file":"a","segment":1,"total":3,"output":"x"}"#,
                r#"{"event":"segment_complete","file":"a","segment":2,"total":3,"output":"y"}"#,
            ],
        );
        let file = tracker.file("a").unwrap();
        assert_eq!(file.status, FileStatus::Processing);
        assert_eq!((file.segments_completed, file.segments_total), (2, 3));

        feed(
            &tracker,
            &[r#"{"event":"file_complete","file":"a","success":true,"output_dir":"dir","segments_completed":2,"segments_total":3}"#],
        );
        let file = tracker.file("a").unwrap();
        assert_eq!(file.status, FileStatus::Completed);
        assert_eq!(file.segments_completed, 2);
        assert_eq!(file.segments_total, 3);
        assert_eq!(file.output_dir.as_deref(), Some("dir"));
    }

    #[test]
    fn test_file_complete_without_counters_keeps_running_counts() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a"]));
        feed(
            &tracker,
            &[
                r#"{"event":"segment_complete","file":"a","segment":1,"total":2,"output":"x"}"#,
                r#"{"event":"file_complete","file":"a","success":true,"output":"/out/a.gif","size":"1.2 MB"}"#,
            ],
        );
        let file = tracker.file("a").unwrap();
        assert_eq!((file.segments_completed, file.segments_total), (1, 2));
        assert_eq!(file.output_path.as_deref(), Some("/out/a.gif"));
        assert_eq!(file.output_size.as_deref(), Some("1.2 MB"));
    }

    #[test]
    fn test_file_failures() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a", "b", "c"]));
        feed(
            &tracker,
            &[
                r#"{"event":"file_start","file":"a"}"#,
                r#"{"event":"file_error","file":"a","error":"decoder crashed"}"#,
                r#"{"event":"file_complete","file":"b","success":false,"error":"no video stream"}"#,
                r#"{"event":"file_complete","file":"c","success":false}"#,
            ],
        );
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Error("decoder crashed".to_string()));
        assert_eq!(tracker.file("b").unwrap().status, FileStatus::Error("no video stream".to_string()));
        assert_eq!(tracker.file("c").unwrap().status, FileStatus::Error("processing failed".to_string()));
        assert!(tracker.is_running());
    }

    #[test]
    fn test_out_of_order_events_still_apply() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a"]));
        feed(
            &tracker,
            &[r#"{"event":"file_complete","file":"a","success":true}"#],
        );
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Completed);

        feed(&tracker, &[r#"{"event":"file_start","file":"a"}"#]);
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Processing);
    }

    #[test]
    fn test_unknown_file_is_ignored() {
        let tracker = ProgressTracker::new();
        let observer = TestObserver::new();
        tracker.add_observer(observer.clone());
        tracker.begin(&files(&["a"]));

        feed(&tracker, &[r#"{"event":"file_start","file":"ghost.mp4"}"#]);
        assert!(tracker.file("ghost.mp4").is_none());
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Pending);
        assert_eq!(observer.file_changes.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_complete_event_then_nonzero_exit_is_error() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a", "b"]));
        feed(
            &tracker,
            &[
                r#"{"event":"file_complete","file":"a","success":true}"#,
                r#"{"event":"file_complete","file":"b","success":true}"#,
                r#"{"event":"complete","total_files":2,"successful":2,"failed":0}"#,
            ],
        );
        assert_eq!(tracker.status(), BatchStatus::Completed { successful: 2, failed: 0 });

        let status = tracker.finish(&RunOutcome::WorkerFailed {
            code: Some(1),
            stderr_tail: vec![],
        });
        assert!(matches!(status, BatchStatus::Error { .. }));
        assert_eq!(
            tracker.snapshot().reported,
            Some(BatchCounts { successful: 2, failed: 0 })
        );
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Completed);
    }

    #[test]
    fn test_error_event_is_not_downgraded_by_complete() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a"]));
        feed(
            &tracker,
            &[
                r#"{"event":"error","message":"ffmpeg not found"}"#,
                r#"{"event":"complete","total_files":1,"successful":0,"failed":1}"#,
            ],
        );
        let status = tracker.finish(&RunOutcome::Completed);
        assert_eq!(status, BatchStatus::Error { message: "ffmpeg not found".to_string() });
    }

    #[test]
    fn test_clean_exit_without_complete_derives_counts() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a", "b", "c"]));
        feed(
            &tracker,
            &[
                r#"{"event":"file_complete","file":"a","success":true}"#,
                r#"{"event":"file_error","file":"b","error":"bad"}"#,
            ],
        );
        let status = tracker.finish(&RunOutcome::Completed);
        assert_eq!(status, BatchStatus::Completed { successful: 1, failed: 2 });
    }

    #[test]
    fn test_cancel_marks_processing_files() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a", "b", "c"]));
        feed(
            &tracker,
            &[
                r#"{"event":"file_start","file":"a"}"#,
                r#"{"event":"file_complete","file":"a","success":true}"#,
                r#"{"event":"file_start","file":"b"}"#,
            ],
        );

        let status = tracker.finish(&RunOutcome::Cancelled);
        assert_eq!(status, BatchStatus::Cancelled);
        assert_eq!(tracker.file("a").unwrap().status, FileStatus::Completed);
        assert_eq!(tracker.file("b").unwrap().status, FileStatus::Error("cancelled".to_string()));
        assert_eq!(tracker.file("c").unwrap().status, FileStatus::Pending);
    }

    #[test]
    fn test_start_and_progress_recorded() {
        let tracker = ProgressTracker::new();
        tracker.begin(&files(&["a", "b"]));
        feed(
            &tracker,
            &[
                r#"{"event":"start","total_files":2,"hardware_acceleration":true}"#,
                r#"{"event":"progress","current_file":1,"total_files":2,"filename":"a"}"#,
            ],
        );
        let snapshot = tracker.snapshot();
        assert!(snapshot.hardware_acceleration);
        assert_eq!(snapshot.total_files, 2);
        assert_eq!(
            snapshot.overall,
            Some(OverallProgress { current_file: 1, total_files: 2, filename: "a".to_string() })
        );
    }

    #[test]
    fn test_observers_see_status_sequence_and_reset() {
        let tracker = ProgressTracker::new();
        let observer = TestObserver::new();
        tracker.add_observer(observer.clone());

        tracker.begin(&files(&["a"]));
        feed(&tracker, &[r#"{"event":"file_start","file":"a"}"#]);
        tracker.finish(&RunOutcome::Completed);
        tracker.reset();

        assert_eq!(observer.file_changes.load(Ordering::Relaxed), 1);
        assert_eq!(
            *observer.statuses.lock().unwrap(),
            vec![
                BatchStatus::Running,
                BatchStatus::Completed { successful: 0, failed: 1 },
                BatchStatus::Idle,
            ]
        );
        assert!(tracker.snapshot().files.is_empty());
    }
}
