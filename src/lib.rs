//! Vulnera Analytic - Main application library
//!
//! Wires the rollup store, the dashboard and ingestion use cases and the HTTP
//! surface into one service.

mod app;

pub use app::{AppHandle, create_app};
pub use vulnera_analytic_core::{Config, init_tracing};

// Re-export for convenience
pub use vulnera_analytic_api;
pub use vulnera_analytic_core;
