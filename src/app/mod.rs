// Application layer - Use case interactors

pub mod batch_interactor;
pub mod library;
pub mod timeline_editor;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchSummary};
pub use library::{LibraryEntry, MediaLibrary};
pub use timeline_editor::TimelineEditor;
