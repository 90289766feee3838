//! Route definitions and server setup

use std::time::Duration;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use vulnera_analytic_core::config::ServerConfig;

use crate::presentation::{
    controllers::{
        AnalyticState,
        dashboard::{get_repository_dashboard, get_workspace_dashboard},
        health::health_check,
        ingestion::ingest_analysis,
    },
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::dashboard::get_workspace_dashboard,
        crate::presentation::controllers::dashboard::get_repository_dashboard,
        crate::presentation::controllers::ingestion::ingest_analysis,
        crate::presentation::controllers::health::health_check,
    ),
    components(
        schemas(
            DashboardChartsResponse,
            IngestAnalysisRequest,
            IngestionResponse,
            IngestionStatus,
            HealthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "dashboard", description = "Pre-aggregated vulnerability charts per workspace and repository"),
        (name = "ingestion", description = "Ingestion of completed analyses into the rollups"),
        (name = "health", description = "Service liveness")
    ),
    info(
        title = "Vulnera Analytic API",
        version = "0.1.0",
        description = "Dashboard analytics over security analysis results: totals, severity breakdown and findings grouped by author, language, repository and time.",
        license(
            name = "AGPL-3.0",
            url = "https://www.gnu.org/licenses/agpl-3.0.html"
        )
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.allowed_origins.len() == 1 && config.allowed_origins[0] == "*" {
        tracing::warn!("CORS: Using wildcard origin (*)");
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| {
                        tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                    })
                    .ok()
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::ORIGIN,
        ])
        .max_age(Duration::from_secs(3600))
}

/// Create the application router with its middleware stack
pub fn create_router(state: AnalyticState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route(
            "/workspaces/{workspace_id}/dashboard",
            get(get_workspace_dashboard),
        )
        .route(
            "/workspaces/{workspace_id}/repositories/{repository_id}/dashboard",
            get(get_repository_dashboard),
        )
        .route("/analytics/analysis", post(ingest_analysis));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check));

    // Docs stay off in production unless enabled explicitly
    if config.enable_docs {
        router = router.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_seconds),
        ));

    router.layer(service_builder).with_state(state)
}
