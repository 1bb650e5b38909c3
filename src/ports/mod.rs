// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::model::Metadata;
use crate::error::ClipBatchResult;

/// Port for media metadata probing
///
/// Implementations must not invent values: a file whose duration or video
/// stream cannot be read is an error, not a zeroed record.
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file
    async fn probe(&self, path: &Path) -> ClipBatchResult<Metadata>;
}
