//! Batch orchestration: watermark protocol, per-document state machine, and
//! fan-out with per-document failure isolation.

mod document;
mod service;
pub mod types;

pub use service::{BatchApi, PipelineService};
pub use types::{
    BatchError, BatchOutcome, DocumentError, DocumentFailure, DocumentOutcome, DocumentReport,
    InitError, Stage, StageFailure,
};
