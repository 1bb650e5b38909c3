// Timeline editor - Trim/cut edits guarded against running batches

use tracing::debug;

use crate::app::batch_interactor::BatchInteractor;
use crate::domain::errors::DomainError;
use crate::domain::timeline::Timeline;
use crate::engine::progress::ProgressTracker;
use crate::engine::worker::WorkerController;

/// Holds the current timeline snapshot and applies edits to it
///
/// The payload of a running batch was built from the timeline as it was at
/// start, so edits are refused until the batch finishes. A batch is active
/// while its worker process is alive, even after the tracker has settled on
/// an error status.
pub struct TimelineEditor {
    timeline: Timeline,
    tracker: ProgressTracker,
    controller: WorkerController,
}

impl TimelineEditor {
    /// Editor guarded by the batches `interactor` runs
    pub fn new(timeline: Timeline, interactor: &BatchInteractor) -> Self {
        Self {
            timeline,
            tracker: interactor.tracker().clone(),
            controller: interactor.controller(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.controller.state().is_active() || self.tracker.is_running()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn set_trim_start(&mut self, t: f64) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| Ok(timeline.with_trim_start(t)))
    }

    pub fn set_trim_end(&mut self, t: f64) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| Ok(timeline.with_trim_end(t)))
    }

    pub fn add_segment(&mut self) -> Result<&Timeline, DomainError> {
        self.edit(Timeline::with_cut_segment)
    }

    pub fn add_cut_range(&mut self, start: f64, end: f64) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| timeline.with_cut_range(start, end))
    }

    pub fn move_segment_start(&mut self, id: u64, t: f64) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| timeline.with_segment_start(id, t))
    }

    pub fn move_segment_end(&mut self, id: u64, t: f64) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| timeline.with_segment_end(id, t))
    }

    pub fn remove_last_segment(&mut self) -> Result<&Timeline, DomainError> {
        self.edit(|timeline| Ok(timeline.without_last_segment()))
    }

    fn edit<F>(&mut self, f: F) -> Result<&Timeline, DomainError>
    where
        F: FnOnce(&Timeline) -> Result<Timeline, DomainError>,
    {
        if self.is_locked() {
            return Err(DomainError::Busy(
                "timeline cannot be edited while a batch is running".to_string(),
            ));
        }
        self.timeline = f(&self.timeline)?;
        debug!(
            segments = self.timeline.segments().len(),
            effective = self.timeline.effective_duration(),
            "Timeline edited"
        );
        Ok(&self.timeline)
    }
}
