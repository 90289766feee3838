//! Health endpoint

use axum::{extract::State, response::Json};
use chrono::Utc;

use crate::presentation::controllers::AnalyticState;
use crate::presentation::models::HealthResponse;

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AnalyticState>) -> Json<HealthResponse> {
    let ingestion = match &state.ingestion_queue {
        Some(queue) => serde_json::json!({
            "mode": "queued",
            "capacity": queue.capacity(),
            "available": queue.available(),
        }),
        None => serde_json::json!({ "mode": "inline" }),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details: Some(serde_json::json!({ "ingestion": ingestion })),
    })
}
