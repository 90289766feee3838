//! PostgreSQL pool and schema setup

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;

/// Open a connection pool sized from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<Arc<PgPool>, sqlx::Error> {
    info!("Initializing PostgreSQL database pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_idle.unwrap_or(0))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs))
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
        .connect(&config.url)
        .await?;

    Ok(Arc::new(pool))
}

/// Apply the embedded rollup schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Applying rollup schema migrations");
    sqlx::migrate!("./migrations").run(pool).await
}
