//! Vulnera Analytic API - HTTP surface and ingestion worker
//!
//! Exposes the dashboard charts computed by `vulnera-analytic-core` over axum,
//! and feeds completed analyses to the ingestion writer through a bounded
//! in-process queue.

pub mod infrastructure;
pub mod presentation;

pub use infrastructure::{IngestionQueueHandle, spawn_ingestion_worker};
pub use presentation::{AnalyticState, create_router};
