//! Filesystem-backed staging area for in-flight documents.
//!
//! Each document in a batch owns two artifact slots addressed by a
//! deterministic [`StageKey`]: the raw bytes fetched from the source and the
//! plain text produced by the converter. Artifacts live only for the duration
//! of one per-document pipeline run and are deleted by the same pipeline
//! instance that created them.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors raised while reading or writing staging artifacts.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Filesystem operation failed for the given artifact path.
    #[error("Staging I/O failed at {path}: {source}")]
    Io {
        /// Artifact path involved in the failing operation.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

/// Opaque key addressing one document's staging artifacts.
///
/// Derived from the document's fetch URL, so repeated runs over the same
/// source document land on the same slots (last writer wins).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageKey(String);

impl StageKey {
    /// Derive the key for a document from its fetch URL.
    pub fn for_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex form of the key, used as the artifact file stem.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scratch space holding raw and converted artifacts for in-flight documents.
pub struct TempStaging {
    root: PathBuf,
}

impl TempStaging {
    /// Open the staging area rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StagingError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Path of the raw-bytes artifact for `key`.
    pub fn raw_path(&self, key: &StageKey) -> PathBuf {
        self.root.join(format!("{key}.raw"))
    }

    /// Path of the converted-text artifact for `key`.
    pub fn text_path(&self, key: &StageKey) -> PathBuf {
        self.root.join(format!("{key}.txt"))
    }

    /// Create (or truncate) the raw artifact and return a writable handle.
    pub async fn create_raw(&self, key: &StageKey) -> Result<fs::File, StagingError> {
        create_file(&self.raw_path(key)).await
    }

    /// Create (or truncate) the text artifact and return a writable handle.
    pub async fn create_text(&self, key: &StageKey) -> Result<fs::File, StagingError> {
        create_file(&self.text_path(key)).await
    }

    /// Open the raw artifact for streaming reads.
    pub async fn open_raw(&self, key: &StageKey) -> Result<fs::File, StagingError> {
        let path = self.raw_path(key);
        fs::File::open(&path)
            .await
            .map_err(|source| StagingError::Io { path, source })
    }

    /// Read the raw artifact fully into memory.
    pub async fn read_raw(&self, key: &StageKey) -> Result<Vec<u8>, StagingError> {
        read_file(&self.raw_path(key)).await
    }

    /// Read the text artifact fully, replacing invalid UTF-8 sequences.
    pub async fn read_text(&self, key: &StageKey) -> Result<String, StagingError> {
        let bytes = read_file(&self.text_path(key)).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Delete both artifacts for `key`. Absent artifacts are not an error.
    pub async fn delete(&self, key: &StageKey) -> Result<(), StagingError> {
        remove_if_present(&self.raw_path(key)).await?;
        remove_if_present(&self.text_path(key)).await
    }
}

async fn create_file(path: &Path) -> Result<fs::File, StagingError> {
    fs::File::create(path).await.map_err(|source| StagingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn read_file(path: &Path) -> Result<Vec<u8>, StagingError> {
    fs::read(path).await.map_err(|source| StagingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn remove_if_present(path: &Path) -> Result<(), StagingError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StagingError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
