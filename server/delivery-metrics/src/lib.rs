//! Delivery Metrics Engine — deterministic DORA-style analysis.
//!
//! Ingests commit and CI run history, maps each commit to the run that
//! represents its delivery outcome, detects failure/recovery incidents for
//! MTTR, aggregates daily/weekly/per-author rollups, and rates every metric
//! against fixed threshold tables.
//!
//! No AI, no DB, no network; a pure function of its inputs.

pub mod config;
pub mod engine;
pub mod error;
pub mod incidents;
pub mod mapping;
pub mod normalize;
pub mod rating;
pub mod rollup;
pub mod types;

pub use config::Config;
pub use engine::Engine;
pub use error::EngineError;
pub use types::{AnalysisRequest, MetricsReport};
