//! HTTP surface for the harvester.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `GET /` – Liveness page for schedulers and humans checking the service.
//! - `GET /run` – Run one full batch to its barrier and return counters
//!   (`attempted`, `succeeded`, `failed`, `purged`, `started_at`). Returns
//!   200 whenever the barrier completes, even with individual document
//!   failures; only a listing or watermark failure produces an error.
//! - `GET /metrics` – Observe batch counters since startup.
//! - `GET /commands` – Machine-readable command catalog for schedulers/tools.

use crate::metrics::MetricsSnapshot;
use crate::pipeline::{BatchApi, BatchError, BatchOutcome};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;

/// Build the HTTP router exposing the batch trigger surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: BatchApi + 'static,
{
    Router::new()
        .route("/", get(liveness))
        .route("/run", get(run_batch::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Static liveness page served at the root.
async fn liveness() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>harvester</title></head>\
         <body><h1>harvester</h1>\
         <p>Batch pipeline service is up. Trigger a run via <code>GET /run</code>.</p>\
         </body></html>",
    )
}

/// Success response for the `GET /run` endpoint.
#[derive(Serialize)]
struct RunResponse {
    /// Batch start time; also the committed watermark value.
    started_at: String,
    /// Number of documents listed and attempted.
    attempted: usize,
    /// Documents that completed the full pipeline.
    succeeded: usize,
    /// Documents that terminated with a failure.
    failed: usize,
    /// Whether the source acknowledged the purge request.
    purged: bool,
}

impl RunResponse {
    fn from_outcome(outcome: &BatchOutcome) -> Self {
        Self {
            started_at: outcome
                .started_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| outcome.started_at.to_string()),
            attempted: outcome.attempted,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            purged: outcome.purged,
        }
    }
}

/// Run one batch to its barrier.
async fn run_batch<S>(State(service): State<Arc<S>>) -> Result<Json<RunResponse>, AppError>
where
    S: BatchApi,
{
    let outcome = service.run_batch().await?;
    tracing::info!(
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        purged = outcome.purged,
        "Run request completed"
    );
    Ok(Json(RunResponse::from_outcome(&outcome)))
}

/// Return batch counters accumulated since startup.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: BatchApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by schedulers and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "run",
                method: "GET",
                path: "/run",
                description: "Run one harvest batch: list new uploads, convert and publish each document, purge the source, and advance the watermark. Response returns { \"attempted\", \"succeeded\", \"failed\", \"purged\", \"started_at\" }.",
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return batch counters useful for observability dashboards.",
            },
            CommandDescriptor {
                name: "liveness",
                method: "GET",
                path: "/",
                description: "Static liveness page.",
            },
        ],
    })
}

struct AppError(BatchError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<BatchError> for AppError {
    fn from(inner: BatchError) -> Self {
        Self(inner)
    }
}
