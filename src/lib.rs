#![deny(missing_docs)]

//! Core library for the harvester batch pipeline service.

/// HTTP routing and REST handlers.
pub mod api;
/// Thin HTTP clients for the four collaborating services.
pub mod clients;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Batch metrics helpers.
pub mod metrics;
/// Batch orchestration and the per-document pipeline.
pub mod pipeline;
/// Temp staging area for in-flight document artifacts.
pub mod staging;
/// Watermark timestamp persistence.
pub mod watermark;
