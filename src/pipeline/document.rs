//! Per-document pipeline state machine.
//!
//! Strictly ordered: staged → converted → hashed → indexed → stored →
//! cleaned up. Fetch, conversion, and hashing failures are document-fatal;
//! index and blob upsert failures are logged and the machine continues so a
//! partial remote outage cannot wedge staging cleanup. No stage retries.

use crate::clients::{
    BlobClient, BlobRecord, ConvertError, ConverterClient, DocumentRef, DocumentSourceClient,
    IndexClient, IndexRecord, SourceError,
};
use crate::pipeline::types::{DocumentError, DocumentReport, Stage, StageFailure};
use crate::staging::{StageKey, StagingError, TempStaging};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Shared handles one document task needs to run the full state machine.
pub(crate) struct DocumentContext {
    pub(crate) source: Arc<DocumentSourceClient>,
    pub(crate) converter: Arc<ConverterClient>,
    pub(crate) index: Arc<IndexClient>,
    pub(crate) blob: Arc<BlobClient>,
    pub(crate) staging: Arc<TempStaging>,
}

/// Run the state machine for one listed document.
pub(crate) async fn process_document(
    ctx: &DocumentContext,
    document: &DocumentRef,
) -> Result<DocumentReport, DocumentError> {
    let name = document.name.as_str();
    let key = StageKey::for_url(&ctx.source.document_url(name));

    // Staged: fetch raw bytes and stream them into the raw artifact.
    let response = ctx
        .source
        .fetch(name)
        .await
        .map_err(|err| DocumentError::at(Stage::Staged, err))?;
    stage_raw(ctx, &key, response).await?;
    tracing::debug!(document = name, key = %key, stage = %Stage::Staged, "Raw bytes staged");

    // Converted: stream the raw artifact through the converter into the
    // text artifact.
    let raw = ctx
        .staging
        .open_raw(&key)
        .await
        .map_err(|err| DocumentError::at(Stage::Converted, err))?;
    let response = ctx
        .converter
        .convert(raw, name)
        .await
        .map_err(|err| DocumentError::at(Stage::Converted, err))?;
    stage_text(ctx, &key, response).await?;
    tracing::debug!(document = name, stage = %Stage::Converted, "Text artifact written");

    // Hashed: content hash is the canonical identity; empty text still
    // hashes to a valid (degenerate) identifier.
    let content = ctx
        .staging
        .read_text(&key)
        .await
        .map_err(|err| DocumentError::at(Stage::Hashed, err))?;
    let id = content_hash(&content);
    let record = IndexRecord {
        id: id.clone(),
        title: title_for(name).to_string(),
        content,
    };
    tracing::debug!(document = name, id = %record.id, stage = %Stage::Hashed, "Identity derived");

    // Indexed: remote failure is logged and the machine continues.
    let indexed = match ctx.index.upsert(&record).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(document = name, id = %record.id, error = %err, "Index upsert failed; continuing to blob store");
            false
        }
    };

    // Stored: the same identifier keys the blob record.
    let stored = match ctx.staging.read_raw(&key).await {
        Ok(bytes) => match ctx.blob.upsert(&BlobRecord::from_raw(id.clone(), &bytes)).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(document = name, id = %id, error = %err, "Blob upsert failed; continuing to cleanup");
                false
            }
        },
        Err(err) => {
            tracing::warn!(document = name, error = %err, "Raw artifact unreadable for blob store; continuing to cleanup");
            false
        }
    };

    // CleanedUp: best effort, never escalated.
    let cleaned = match ctx.staging.delete(&key).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(document = name, key = %key, error = %err, "Staging cleanup failed");
            false
        }
    };

    Ok(DocumentReport {
        name: name.to_string(),
        id,
        indexed,
        stored,
        cleaned,
    })
}

/// Drain the fetch response into the raw artifact. A failure mid-stream
/// removes the partial artifact so nothing downstream can reference it.
async fn stage_raw(
    ctx: &DocumentContext,
    key: &StageKey,
    response: reqwest::Response,
) -> Result<(), DocumentError> {
    let file = ctx
        .staging
        .create_raw(key)
        .await
        .map_err(|err| DocumentError::at(Stage::Staged, err))?;
    let path = ctx.staging.raw_path(key);

    if let Err(failure) = drain_response(response, file, &path, |net| {
        StageFailure::Source(SourceError::Http(net))
    })
    .await
    {
        if let Err(cleanup) = ctx.staging.delete(key).await {
            tracing::warn!(key = %key, error = %cleanup, "Failed to remove partial raw artifact");
        }
        return Err(DocumentError { stage: Stage::Staged, source: failure });
    }
    Ok(())
}

/// Drain the converter response into the text artifact. The raw artifact is
/// left in place on failure for the next run to overwrite.
async fn stage_text(
    ctx: &DocumentContext,
    key: &StageKey,
    response: reqwest::Response,
) -> Result<(), DocumentError> {
    let file = ctx
        .staging
        .create_text(key)
        .await
        .map_err(|err| DocumentError::at(Stage::Converted, err))?;
    let path = ctx.staging.text_path(key);

    drain_response(response, file, &path, |net| {
        StageFailure::Convert(ConvertError::Http(net))
    })
    .await
    .map_err(|failure| DocumentError {
        stage: Stage::Converted,
        source: failure,
    })
}

async fn drain_response(
    response: reqwest::Response,
    mut file: tokio::fs::File,
    path: &Path,
    on_net: impl Fn(reqwest::Error) -> StageFailure,
) -> Result<(), StageFailure> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(&on_net)?;
        file.write_all(&chunk)
            .await
            .map_err(|source| staging_io(path, source))?;
    }
    file.flush()
        .await
        .map_err(|source| staging_io(path, source))?;
    Ok(())
}

fn staging_io(path: &Path, source: std::io::Error) -> StageFailure {
    StageFailure::Staging(StagingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Deterministic SHA-256 identity for a document's converted text.
pub(crate) fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Document title: the source name with its final extension suffix removed.
pub(crate) fn title_for(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_hashes_to_identical_identity() {
        // Identity derives from content, never from the source name.
        let a = content_hash("quarterly report body");
        let b = content_hash("quarterly report body");
        let c = content_hash("different body");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn empty_text_still_produces_an_identity() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn title_strips_only_the_final_extension() {
        assert_eq!(title_for("a.pdf"), "a");
        assert_eq!(title_for("archive.tar.gz"), "archive.tar");
        assert_eq!(title_for("noext"), "noext");
        assert_eq!(title_for(".hidden"), ".hidden");
    }
}
