//! Analysis ingestion endpoint

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, instrument, warn};

use vulnera_analytic_core::application::dashboard::IngestionOutcome;

use crate::infrastructure::IngestionQueueError;
use crate::presentation::controllers::AnalyticState;
use crate::presentation::models::{
    ErrorResponse, IngestAnalysisRequest, IngestionResponse, error_response,
};

/// POST /api/v1/analytics/analysis - Ingest a completed analysis
///
/// Queued for the background worker when it runs (202), written inline otherwise.
/// Inline writes answer 200 when every facet is stored, 207 when some facets
/// fail and 500 when all of them do; the body lists the failed facets.
#[utoipa::path(
    post,
    path = "/api/v1/analytics/analysis",
    request_body = IngestAnalysisRequest,
    responses(
        (status = 202, description = "Analysis queued for ingestion", body = IngestionResponse),
        (status = 200, description = "Analysis ingested inline", body = IngestionResponse),
        (status = 207, description = "Some facets failed to ingest", body = IngestionResponse),
        (status = 400, description = "Malformed payload or analysis still running", body = ErrorResponse),
        (status = 500, description = "Every facet failed to ingest", body = IngestionResponse),
        (status = 503, description = "Ingestion queue is full or closed", body = ErrorResponse)
    ),
    tag = "ingestion"
)]
#[instrument(skip(state, payload), fields(analysis_id))]
pub async fn ingest_analysis(
    State(state): State<AnalyticState>,
    payload: Result<Json<IngestAnalysisRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(IngestAnalysisRequest(analysis)) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected analysis payload");
        error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_PAYLOAD",
            &rejection.body_text(),
        )
    })?;
    tracing::Span::current().record("analysis_id", tracing::field::display(analysis.id));

    if !analysis.is_finished() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "ANALYSIS_RUNNING",
            &format!("Analysis {} has not finished", analysis.id),
        ));
    }

    let Some(queue) = &state.ingestion_queue else {
        let outcome = state
            .ingest_analysis_use_case
            .execute(&analysis)
            .await
            .map_err(|e| {
                if e.is_client_error() {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_ANALYSIS",
                        &e.to_string(),
                    );
                }
                error!(error = %e, "Failed to ingest analysis");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INGESTION_FAILED",
                    "Failed to ingest analysis",
                )
            })?;

        let status = match &outcome {
            IngestionOutcome::Ingested(report) if report.is_failed() => {
                error!("Every facet failed to ingest");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IngestionOutcome::Ingested(report) if !report.is_complete() => {
                StatusCode::MULTI_STATUS
            }
            _ => StatusCode::OK,
        };

        return Ok((status, Json(IngestionResponse::from(&outcome))).into_response());
    };

    let analysis_id = analysis.id.as_uuid();
    queue.enqueue(analysis).map_err(|e| {
        let code = match e {
            IngestionQueueError::Full => "QUEUE_FULL",
            IngestionQueueError::Closed => "QUEUE_CLOSED",
        };
        error_response(StatusCode::SERVICE_UNAVAILABLE, code, &e.to_string())
    })?;

    info!("Analysis queued for ingestion");
    Ok((
        StatusCode::ACCEPTED,
        Json(IngestionResponse::queued(analysis_id)),
    )
        .into_response())
}
