//! Durable watermark marking the boundary between processed and unprocessed uploads.
//!
//! The watermark is a single RFC3339 timestamp in a marker file. It is read
//! once at batch start and rewritten exactly once, after the batch barrier,
//! to the batch's start time. An absent or unparsable marker reads as the
//! Unix epoch so a fresh deployment processes everything available.

use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::fs;

/// Errors raised while reading or committing the watermark.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// Filesystem operation on the marker file failed.
    #[error("Watermark I/O failed at {path}: {source}")]
    Io {
        /// Marker file path involved in the failing operation.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Timestamp could not be rendered to RFC3339.
    #[error("Failed to format watermark timestamp: {0}")]
    Format(#[from] time::error::Format),
}

/// File-backed store for the batch watermark timestamp.
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Create a store around the given marker file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the current watermark.
    ///
    /// Returns the Unix epoch when the marker file does not exist or holds an
    /// unparsable value; only a filesystem error on an existing file escalates.
    pub async fn load(&self) -> Result<OffsetDateTime, WatermarkError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => match OffsetDateTime::parse(raw.trim(), &Rfc3339) {
                Ok(timestamp) => Ok(timestamp),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "Watermark file unparsable; treating as epoch"
                    );
                    Ok(OffsetDateTime::UNIX_EPOCH)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No watermark yet; starting from epoch");
                Ok(OffsetDateTime::UNIX_EPOCH)
            }
            Err(source) => Err(WatermarkError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Persist a new watermark value.
    ///
    /// Written to a sibling temp file and renamed into place so a crash
    /// mid-write never leaves a truncated marker.
    pub async fn commit(&self, timestamp: OffsetDateTime) -> Result<(), WatermarkError> {
        let formatted = timestamp.format(&Rfc3339)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| io_error(parent, source))?;
        }

        let temp = self.path.with_extension("tmp");
        fs::write(&temp, formatted.as_bytes())
            .await
            .map_err(|source| io_error(&temp, source))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|source| io_error(&self.path, source))?;
        tracing::debug!(path = %self.path.display(), watermark = %formatted, "Watermark committed");
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> WatermarkError {
    WatermarkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn absent_marker_reads_as_epoch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WatermarkStore::new(dir.path().join("watermark"));

        let value = store.load().await.expect("load");
        assert_eq!(value, OffsetDateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn unparsable_marker_reads_as_epoch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("watermark");
        std::fs::write(&path, "not a timestamp").expect("seed file");

        let store = WatermarkStore::new(&path);
        let value = store.load().await.expect("load");
        assert_eq!(value, OffsetDateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn commit_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WatermarkStore::new(dir.path().join("nested").join("watermark"));
        let timestamp = datetime!(2024-05-01 12:30:00 UTC);

        store.commit(timestamp).await.expect("commit");
        let value = store.load().await.expect("load");
        assert_eq!(value, timestamp);
    }

    #[tokio::test]
    async fn commit_overwrites_previous_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WatermarkStore::new(dir.path().join("watermark"));

        store.commit(datetime!(2024-05-01 00:00:00 UTC)).await.expect("first");
        let later = datetime!(2024-06-01 00:00:00 UTC);
        store.commit(later).await.expect("second");

        assert_eq!(store.load().await.expect("load"), later);
    }
}
