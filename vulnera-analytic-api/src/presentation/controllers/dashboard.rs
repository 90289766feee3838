//! Dashboard chart endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
};
use tracing::{error, instrument};
use uuid::Uuid;

use vulnera_analytic_core::domain::analysis::{RepositoryId, WorkspaceId};
use vulnera_analytic_core::domain::dashboard::{DashboardError, DashboardFilter, FilterParams};

use crate::presentation::controllers::AnalyticState;
use crate::presentation::models::{DashboardChartsResponse, ErrorResponse, error_response};

/// GET /api/v1/workspaces/{workspace_id}/dashboard - Charts for a whole workspace
#[utoipa::path(
    get,
    path = "/api/v1/workspaces/{workspace_id}/dashboard",
    params(
        ("workspace_id" = Uuid, Path, description = "Workspace ID"),
        ("initialDate" = Option<String>, Query, description = "Start of the range (RFC 3339), requires finalDate"),
        ("finalDate" = Option<String>, Query, description = "End of the range (RFC 3339), requires initialDate"),
        ("page" = Option<u32>, Query, description = "1-based page of the grouped charts"),
        ("size" = Option<u32>, Query, description = "Page size of the grouped charts")
    ),
    responses(
        (status = 200, description = "Dashboard charts", body = DashboardChartsResponse),
        (status = 400, description = "Invalid identifier or filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "dashboard"
)]
#[instrument(skip(state, params), fields(workspace_id = %workspace_id))]
pub async fn get_workspace_dashboard(
    State(state): State<AnalyticState>,
    Path(workspace_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<DashboardChartsResponse>, Response> {
    let workspace_id = WorkspaceId::new(parse_id("workspace_id", &workspace_id)?);
    charts(&state, workspace_id, None, &params).await
}

/// GET /api/v1/workspaces/{workspace_id}/repositories/{repository_id}/dashboard - Charts for one repository
#[utoipa::path(
    get,
    path = "/api/v1/workspaces/{workspace_id}/repositories/{repository_id}/dashboard",
    params(
        ("workspace_id" = Uuid, Path, description = "Workspace ID"),
        ("repository_id" = Uuid, Path, description = "Repository ID"),
        ("initialDate" = Option<String>, Query, description = "Start of the range (RFC 3339), requires finalDate"),
        ("finalDate" = Option<String>, Query, description = "End of the range (RFC 3339), requires initialDate"),
        ("page" = Option<u32>, Query, description = "1-based page of the grouped charts"),
        ("size" = Option<u32>, Query, description = "Page size of the grouped charts")
    ),
    responses(
        (status = 200, description = "Dashboard charts", body = DashboardChartsResponse),
        (status = 400, description = "Invalid identifier or filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "dashboard"
)]
#[instrument(skip(state, params), fields(workspace_id = %workspace_id, repository_id = %repository_id))]
pub async fn get_repository_dashboard(
    State(state): State<AnalyticState>,
    Path((workspace_id, repository_id)): Path<(String, String)>,
    Query(params): Query<FilterParams>,
) -> Result<Json<DashboardChartsResponse>, Response> {
    let workspace_id = WorkspaceId::new(parse_id("workspace_id", &workspace_id)?);
    let repository_id = RepositoryId::new(parse_id("repository_id", &repository_id)?);
    charts(&state, workspace_id, Some(repository_id), &params).await
}

async fn charts(
    state: &AnalyticState,
    workspace_id: WorkspaceId,
    repository_id: Option<RepositoryId>,
    params: &FilterParams,
) -> Result<Json<DashboardChartsResponse>, Response> {
    let filter = DashboardFilter::parse(workspace_id, repository_id, params, state.max_page_size)
        .map_err(map_dashboard_error)?;

    let charts = state
        .get_dashboard_charts_use_case
        .execute(&filter)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get dashboard charts");
            map_dashboard_error(e)
        })?;

    Ok(Json(charts.into()))
}

fn parse_id(name: &str, raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_IDENTIFIER",
            &format!("{} must be a UUID", name),
        )
    })
}

fn map_dashboard_error(error: DashboardError) -> Response {
    let (status, code) = match &error {
        DashboardError::InvalidFilter { .. } => (StatusCode::BAD_REQUEST, "INVALID_FILTER"),
        DashboardError::InvalidAnalysis { .. } => (StatusCode::BAD_REQUEST, "INVALID_ANALYSIS"),
        DashboardError::DatabaseError { .. } => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to read dashboard data",
            );
        }
        DashboardError::InternalError { .. } => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to assemble dashboard",
            );
        }
    };

    error_response(status, code, &error.to_string())
}
