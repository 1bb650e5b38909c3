// Media library - Files of the next batch and their probed metadata

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{MediaFileRef, Metadata};
use crate::ports::ProbePort;

/// One file in the library
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub file: MediaFileRef,
    /// `None` until probing succeeded
    pub metadata: Option<Metadata>,
    pub probe_error: Option<String>,
}

/// Owned, ordered map from file id to its entry
///
/// Probing runs concurrently but results are applied here, by the owner, so
/// metadata backfill never races with other edits.
#[derive(Debug, Default)]
pub struct MediaLibrary {
    entries: Vec<LibraryEntry>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; ids (file names) must be unique within the library
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<&MediaFileRef, DomainError> {
        let file = MediaFileRef::from_path(path)?;
        if self.get(&file.id).is_some() {
            return Err(DomainError::BadArgs(format!(
                "A file named {} is already in the batch",
                file.id
            )));
        }
        self.entries.push(LibraryEntry {
            file,
            metadata: None,
            probe_error: None,
        });
        let index = self.entries.len() - 1;
        Ok(&self.entries[index].file)
    }

    pub fn remove(&mut self, id: &str) -> Option<LibraryEntry> {
        let index = self.entries.iter().position(|entry| entry.file.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|entry| entry.file.id == id)
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// File refs in insertion order
    pub fn files(&self) -> Vec<MediaFileRef> {
        self.entries.iter().map(|entry| entry.file.clone()).collect()
    }

    /// Probe every file that has no metadata yet
    ///
    /// Returns how many files were probed successfully.
    pub async fn probe_all(&mut self, prober: Arc<dyn ProbePort>) -> usize {
        let mut tasks = JoinSet::new();
        for entry in self.entries.iter().filter(|entry| entry.metadata.is_none()) {
            let prober = Arc::clone(&prober);
            let file = entry.file.clone();
            tasks.spawn(async move {
                let result = prober.probe(file.path()).await;
                (file.id, result)
            });
        }

        let mut probed = 0;
        while let Some(joined) = tasks.join_next().await {
            let (id, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Probe task failed");
                    continue;
                }
            };
            // The file may have been removed meanwhile; nothing to update then
            let Some(entry) = self.entries.iter_mut().find(|entry| entry.file.id == id) else {
                continue;
            };
            match result {
                Ok(metadata) => {
                    debug!(file = %id, duration = metadata.duration, "Probed");
                    entry.metadata = Some(metadata);
                    entry.probe_error = None;
                    probed += 1;
                }
                Err(e) => {
                    warn!(file = %id, error = %e, "Probe failed");
                    entry.probe_error = Some(e.to_string());
                }
            }
        }
        probed
    }

    /// Shortest probed duration; drives the shared GIF timeline
    pub fn shortest_duration(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|entry| entry.metadata.as_ref().map(|metadata| metadata.duration))
            .filter(|duration| *duration > 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClipBatchError, ClipBatchResult};
    use async_trait::async_trait;
    use std::path::Path;

    struct FakeProber;

    #[async_trait]
    impl ProbePort for FakeProber {
        async fn probe(&self, path: &Path) -> ClipBatchResult<Metadata> {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match name.parse::<f64>() {
                Ok(duration) => Ok(Metadata::new(duration, 30.0, 0, 1280, 720, "h264".to_string())?),
                Err(_) => Err(ClipBatchError::Probe {
                    message: format!("cannot read {}", name),
                }),
            }
        }
    }

    #[test]
    fn test_add_rejects_duplicate_names() {
        let mut library = MediaLibrary::new();
        library.add("/a/clip.mp4").unwrap();
        assert!(library.add("/b/clip.mp4").is_err());
        library.add("/b/other.mp4").unwrap();

        let ids: Vec<String> = library.files().into_iter().map(|file| file.id).collect();
        assert_eq!(ids, vec!["clip.mp4", "other.mp4"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut library = MediaLibrary::new();
        library.add("/a/one.mp4").unwrap();
        library.add("/a/two.mp4").unwrap();
        assert!(library.remove("one.mp4").is_some());
        assert!(library.remove("one.mp4").is_none());
        assert_eq!(library.len(), 1);
        library.clear();
        assert!(library.is_empty());
    }

    #[tokio::test]
    async fn test_probe_all_backfills_metadata() {
        let mut library = MediaLibrary::new();
        library.add("/m/12.5.mp4").unwrap();
        library.add("/m/40.mp4").unwrap();
        library.add("/m/broken.mp4").unwrap();

        let probed = library.probe_all(Arc::new(FakeProber)).await;
        assert_eq!(probed, 2);
        assert_eq!(library.get("40.mp4").unwrap().metadata.as_ref().unwrap().duration, 40.0);
        assert!(library.get("broken.mp4").unwrap().probe_error.is_some());
        assert_eq!(library.shortest_duration(), Some(12.5));
    }

    #[test]
    fn test_shortest_duration_without_metadata() {
        let mut library = MediaLibrary::new();
        library.add("/m/a.mp4").unwrap();
        assert_eq!(library.shortest_duration(), None);
    }
}
