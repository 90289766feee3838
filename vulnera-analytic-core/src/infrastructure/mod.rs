//! Infrastructure layer - Storage backends for dashboard rollups

pub mod dashboard;
pub mod database;

pub use dashboard::{InMemoryDashboardRepository, SqlxDashboardRepository};
pub use database::{create_pool, run_migrations};
