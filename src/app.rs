//! Application setup and wiring

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use vulnera_analytic_api::infrastructure::{IngestionQueueHandle, spawn_ingestion_worker};
use vulnera_analytic_api::presentation::{AnalyticState, create_router};
use vulnera_analytic_core::Config;
use vulnera_analytic_core::application::dashboard::{
    AnalysisAggregator, GetDashboardChartsUseCase, IngestAnalysisUseCase,
};
use vulnera_analytic_core::config::StorageBackend;
use vulnera_analytic_core::domain::dashboard::IDashboardRepository;
use vulnera_analytic_core::infrastructure::{
    InMemoryDashboardRepository, SqlxDashboardRepository, create_pool, run_migrations,
};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
    /// Background ingestion worker, when enabled
    pub ingestion_worker: Option<JoinHandle<()>>,
}

async fn dashboard_repository(
    config: &Config,
) -> Result<Arc<dyn IDashboardRepository>, Box<dyn std::error::Error + Send + Sync>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;

            if config.database.run_migrations {
                run_migrations(&pool).await?;
            }

            Ok(Arc::new(SqlxDashboardRepository::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory rollup store; data is lost on restart");
            Ok(Arc::new(InMemoryDashboardRepository::new()))
        }
    }
}

/// Create the application router and start background workers
pub async fn create_app(
    config: Config,
) -> Result<AppHandle, Box<dyn std::error::Error + Send + Sync>> {
    let shutdown_token = CancellationToken::new();
    let dashboard_repository = dashboard_repository(&config).await?;

    let get_dashboard_charts_use_case = Arc::new(GetDashboardChartsUseCase::with_strategy(
        dashboard_repository.clone(),
        config.dashboard.query_strategy,
    ));
    let ingest_analysis_use_case = Arc::new(
        IngestAnalysisUseCase::new(
            dashboard_repository,
            AnalysisAggregator::new(config.dashboard.time_bucket),
        )
        .skip_duplicates(config.ingestion.skip_duplicates),
    );

    let (ingestion_queue, ingestion_worker) = if config.ingestion.enabled {
        let (queue, receiver) = IngestionQueueHandle::channel(config.ingestion.queue_capacity);
        let worker = spawn_ingestion_worker(
            receiver,
            ingest_analysis_use_case.clone(),
            config.ingestion.max_concurrent_ingestions,
            shutdown_token.clone(),
        );
        (Some(queue), Some(worker))
    } else {
        tracing::info!("Background ingestion disabled; analyses are ingested inline");
        (None, None)
    };

    let state = AnalyticState {
        get_dashboard_charts_use_case,
        ingest_analysis_use_case,
        ingestion_queue,
        max_page_size: config.dashboard.max_page_size,
    };

    let router = create_router(state, &config.server);

    Ok(AppHandle {
        router,
        shutdown_token,
        ingestion_worker,
    })
}
