//! Brut Engagement - Filtering and aggregation engine for engagement dashboards
//!
//! The engine turns a raw table of social media posts into the views a
//! dashboard draws, through a one-way pipeline: load → metric derivation →
//! filtering → aggregation → snapshot encoding.
//!
//! ## Modules
//!
//! - **Schema / Source**: CSV ingestion with per-row rejection, session cache,
//!   synthetic fallback for a missing table
//! - **Metrics**: engagement rate with an explicit zero-view rule
//! - **Filter / Aggregate**: selection predicates and the five dashboard views

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod generator;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod types;

pub use aggregate::Aggregator;
pub use catalog::Dimensions;
pub use config::EngineConfig;
pub use error::{ComputeError, ConfigError};
pub use filter::FilterEngine;
pub use metrics::{engagement_rate, MetricDeriver};
pub use pipeline::{render_dashboard, DashboardEngine, ViewOptions};
pub use source::{DataOrigin, Dataset, DatasetCache, LoadOptions};
pub use types::{DashboardView, FilterSpec, Kpis, MeasuredRecord};

// Schema exports
pub use schema::{EngagementRecord, LoadReport, RecordAdapter};

/// Engine version embedded in all snapshots
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshots
pub const PRODUCER_NAME: &str = "brut-engagement";
