//! Observability helpers.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; subscriber install is the host's call
//! - Metrics go through the `metrics` facade; hosts install any recorder
//!   (or none — recording against no recorder is free)

pub mod logging;
pub mod metrics;
