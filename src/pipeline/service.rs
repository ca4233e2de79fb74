//! Batch orchestrator driving the watermark protocol and per-document fan-out.

use crate::clients::{BlobClient, ConverterClient, DocumentSourceClient, IndexClient};
use crate::config::Config;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::pipeline::document::{DocumentContext, process_document};
use crate::pipeline::types::{BatchError, BatchOutcome, DocumentFailure, DocumentOutcome, InitError};
use crate::staging::TempStaging;
use crate::watermark::WatermarkStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task::JoinSet;

/// Coordinates one batch run: watermark read, source listing, per-document
/// fan-out, the settle barrier, source purge, and the watermark commit.
///
/// The service owns long-lived handles to the four service clients, the
/// staging area, and the watermark store. Construct it once near process
/// start and share it through an `Arc`.
pub struct PipelineService {
    source: Arc<DocumentSourceClient>,
    converter: Arc<ConverterClient>,
    index: Arc<IndexClient>,
    blob: Arc<BlobClient>,
    staging: Arc<TempStaging>,
    watermark: WatermarkStore,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the batch pipeline used by the HTTP surface.
#[async_trait]
pub trait BatchApi: Send + Sync {
    /// Run one full batch to its barrier and report the outcome.
    async fn run_batch(&self) -> Result<BatchOutcome, BatchError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Build a new pipeline service from validated configuration.
    pub fn new(config: &Config) -> Result<Self, InitError> {
        Ok(Self {
            source: Arc::new(DocumentSourceClient::new(&config.source_url)?),
            converter: Arc::new(ConverterClient::new(&config.converter_url)?),
            index: Arc::new(IndexClient::new(
                &config.index_url,
                &config.index_collection,
            )?),
            blob: Arc::new(BlobClient::new(&config.blob_url)?),
            staging: Arc::new(TempStaging::new(&config.staging_dir)?),
            watermark: WatermarkStore::new(&config.watermark_file),
            metrics: Arc::new(PipelineMetrics::new()),
        })
    }

    /// Run one batch.
    ///
    /// The watermark and the purge cutoff are both the batch *start* time so
    /// a document uploaded mid-run can never be purged before it was listed.
    /// Individual document failures are isolated; only a listing failure or
    /// a watermark failure aborts the batch.
    pub async fn run_batch(&self) -> Result<BatchOutcome, BatchError> {
        let started_at = OffsetDateTime::now_utc();
        let previous = self.watermark.load().await?;
        tracing::info!(previous_watermark = %previous, "Batch started");

        let documents = self
            .source
            .list_since(previous)
            .await
            .map_err(BatchError::List)?;
        tracing::info!(count = documents.len(), "Source listing complete");

        let mut tasks = JoinSet::new();
        let mut names: HashMap<tokio::task::Id, String> = HashMap::new();
        for document in documents {
            let ctx = DocumentContext {
                source: Arc::clone(&self.source),
                converter: Arc::clone(&self.converter),
                index: Arc::clone(&self.index),
                blob: Arc::clone(&self.blob),
                staging: Arc::clone(&self.staging),
            };
            let name = document.name.clone();
            let handle = tasks.spawn(async move {
                let result = process_document(&ctx, &document).await;
                DocumentOutcome {
                    name: document.name,
                    result: result.map_err(DocumentFailure::Stage),
                }
            });
            names.insert(handle.id(), name);
        }

        // Barrier: every task settles before purge and watermark commit.
        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => {
                    if let Err(failure) = &outcome.result {
                        tracing::warn!(document = %outcome.name, error = %failure, "Document pipeline failed");
                    }
                    outcomes.push(outcome);
                }
                Err(join_error) => {
                    let name = names
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_else(|| "<unknown>".to_string());
                    tracing::error!(document = %name, error = %join_error, "Document task panicked");
                    outcomes.push(DocumentOutcome {
                        name,
                        result: Err(DocumentFailure::Panicked(join_error.to_string())),
                    });
                }
            }
        }

        let attempted = outcomes.len();
        let succeeded = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count();
        let failed = attempted - succeeded;

        // Purge failure leaves documents on the source; they are invisible
        // to later listings (watermark excludes them) and the next
        // successful purge removes them.
        let purged = match self.source.purge_older_than(started_at).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "Source purge failed; leaving documents for the next batch");
                false
            }
        };

        self.watermark.commit(started_at).await?;
        self.metrics.record_batch(succeeded as u64, failed as u64);
        tracing::info!(
            attempted,
            succeeded,
            failed,
            purged,
            watermark = %started_at,
            "Batch completed"
        );

        Ok(BatchOutcome {
            started_at,
            attempted,
            succeeded,
            failed,
            purged,
            outcomes,
        })
    }

    /// Return the current batch metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl BatchApi for PipelineService {
    async fn run_batch(&self) -> Result<BatchOutcome, BatchError> {
        PipelineService::run_batch(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}
