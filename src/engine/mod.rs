//! Batch execution engine: worker supervision and progress projection

pub mod progress;
pub mod worker;

pub use progress::{
    ConsoleObserver, JsonObserver, NoOpObserver, OverallProgress, ProgressObserver, ProgressTracker,
    TrackerSnapshot,
};
pub use worker::{ControllerState, WorkerCommand, WorkerController};
