//! Dashboard application services
//!
//! Aggregation of analyses into rollups, ingestion into the rollup store,
//! and assembly of the dashboard charts.

pub mod aggregation;
pub mod ingestion;
pub mod use_cases;

pub use aggregation::*;
pub use ingestion::*;
pub use use_cases::*;
