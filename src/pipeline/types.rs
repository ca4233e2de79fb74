//! Core data types and error definitions for the batch pipeline.

use crate::clients::{BlobError, ConvertError, IndexError, SourceError};
use crate::staging::StagingError;
use crate::watermark::WatermarkError;
use thiserror::Error;
use time::OffsetDateTime;

/// Stages of the per-document pipeline, in execution order.
///
/// The machine never skips a stage and never proceeds past a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raw bytes fetched from the source and written to staging.
    Staged,
    /// Raw bytes converted to plain text by the remote converter.
    Converted,
    /// Content hash and title derived from the converted text.
    Hashed,
    /// Record upserted to the search index.
    Indexed,
    /// Raw payload upserted to the blob store.
    Stored,
    /// Staging artifacts removed.
    CleanedUp,
}

impl Stage {
    /// Stable lowercase name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Converted => "converted",
            Self::Hashed => "hashed",
            Self::Indexed => "indexed",
            Self::Stored => "stored",
            Self::CleanedUp => "cleaned_up",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Underlying cause of a document-fatal stage failure.
#[derive(Debug, Error)]
pub enum StageFailure {
    /// Document source interaction failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Converter interaction failed.
    #[error(transparent)]
    Convert(#[from] ConvertError),
    /// Staging artifact read or write failed.
    #[error(transparent)]
    Staging(#[from] StagingError),
}

/// Document-fatal failure: aborts one document's pipeline at the failed
/// stage without affecting its siblings.
#[derive(Debug, Error)]
#[error("Stage {stage} failed: {source}")]
pub struct DocumentError {
    /// Stage at which the pipeline aborted.
    pub stage: Stage,
    /// Underlying cause.
    #[source]
    pub source: StageFailure,
}

impl DocumentError {
    /// Tag a failure with the stage it occurred at.
    pub fn at(stage: Stage, source: impl Into<StageFailure>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Terminal failure recorded for one document in a batch.
#[derive(Debug, Error)]
pub enum DocumentFailure {
    /// The pipeline aborted at a specific stage.
    #[error(transparent)]
    Stage(#[from] DocumentError),
    /// The document's task panicked before settling.
    #[error("Document task panicked: {0}")]
    Panicked(String),
}

/// Batch-fatal failure: aborts the entire run and leaves the watermark
/// untouched.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Listing the source documents failed; nothing can be identified.
    #[error("Failed to list source documents: {0}")]
    List(#[source] SourceError),
    /// Watermark read or commit failed.
    #[error("Watermark store failed: {0}")]
    Watermark(#[from] WatermarkError),
}

/// Errors raised while constructing the pipeline service.
#[derive(Debug, Error)]
pub enum InitError {
    /// Document source client could not be built.
    #[error("Failed to build source client: {0}")]
    Source(#[from] SourceError),
    /// Converter client could not be built.
    #[error("Failed to build converter client: {0}")]
    Convert(#[from] ConvertError),
    /// Index client could not be built.
    #[error("Failed to build index client: {0}")]
    Index(#[from] IndexError),
    /// Blob client could not be built.
    #[error("Failed to build blob client: {0}")]
    Blob(#[from] BlobError),
    /// Staging directory could not be prepared.
    #[error("Failed to open staging area: {0}")]
    Staging(#[from] StagingError),
}

/// Successful per-document result.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// Source-relative document name.
    pub name: String,
    /// Content hash shared by the index record and the blob record.
    pub id: String,
    /// Whether the index upsert was acknowledged.
    pub indexed: bool,
    /// Whether the blob upsert was acknowledged.
    pub stored: bool,
    /// Whether staging artifacts were removed.
    pub cleaned: bool,
}

/// Settled outcome for one document in a batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Source-relative document name.
    pub name: String,
    /// Final result of the per-document pipeline.
    pub result: Result<DocumentReport, DocumentFailure>,
}

/// Summary of a completed batch produced by
/// [`crate::pipeline::PipelineService::run_batch`].
#[derive(Debug)]
pub struct BatchOutcome {
    /// Instant recorded before listing; also the committed watermark value.
    pub started_at: OffsetDateTime,
    /// Number of documents listed and attempted.
    pub attempted: usize,
    /// Documents that completed the full pipeline.
    pub succeeded: usize,
    /// Documents that terminated with a failure.
    pub failed: usize,
    /// Whether the source acknowledged the purge request.
    pub purged: bool,
    /// Per-document outcomes, in settle order.
    pub outcomes: Vec<DocumentOutcome>,
}
