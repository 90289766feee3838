//! API request and response models

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use vulnera_analytic_core::application::dashboard::{IngestionOutcome, IngestionReport};
use vulnera_analytic_core::domain::analysis::AnalysisResult;
use vulnera_analytic_core::domain::dashboard::{
    DashboardCharts, VulnerabilitiesByAuthor, VulnerabilitiesByLanguage,
    VulnerabilitiesByRepository, VulnerabilitiesByTime, VulnerabilityCounters,
};

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "INVALID_FILTER")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "initialDate and finalDate must be provided together")]
    pub message: String,

    /// Additional error context
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    pub request_id: Uuid,

    /// Error occurrence timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Render an [`ErrorResponse`] with the given status
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(ErrorResponse {
        code: code.to_string(),
        message: message.to_string(),
        details: None,
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    });

    (status, body).into_response()
}

/// Every chart of a dashboard, in a single document
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardChartsResponse {
    /// Distinct authors with findings in range
    #[schema(example = 12)]
    pub total_developers: u64,

    /// Distinct repositories with findings in range
    #[schema(example = 3)]
    pub total_repositories: u64,

    /// Findings per severity and triage state
    #[schema(value_type = Object)]
    pub vulnerability_by_severity: VulnerabilityCounters,

    #[schema(value_type = Vec<Object>)]
    pub vulnerabilities_by_author: Vec<VulnerabilitiesByAuthor>,

    #[schema(value_type = Vec<Object>)]
    pub vulnerabilities_by_repository: Vec<VulnerabilitiesByRepository>,

    #[schema(value_type = Vec<Object>)]
    pub vulnerabilities_by_language: Vec<VulnerabilitiesByLanguage>,

    /// Time buckets in ascending order
    #[schema(value_type = Vec<Object>)]
    pub vulnerabilities_by_time: Vec<VulnerabilitiesByTime>,
}

impl From<DashboardCharts> for DashboardChartsResponse {
    fn from(charts: DashboardCharts) -> Self {
        Self {
            total_developers: charts.total_developers,
            total_repositories: charts.total_repositories,
            vulnerability_by_severity: charts.vulnerability_by_severity,
            vulnerabilities_by_author: charts.vulnerabilities_by_author,
            vulnerabilities_by_repository: charts.vulnerabilities_by_repository,
            vulnerabilities_by_language: charts.vulnerabilities_by_language,
            vulnerabilities_by_time: charts.vulnerabilities_by_time,
        }
    }
}

/// Completed analysis pushed by the analysis platform
#[derive(Debug, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct IngestAnalysisRequest(pub AnalysisResult);

/// Where an ingestion request ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    /// Accepted by the background worker
    Queued,
    /// Written inline
    Ingested,
    /// Written inline, with some facets failing
    Partial,
    /// Written inline, with every facet failing
    Failed,
    /// Already ingested, nothing written
    Duplicate,
}

/// Ingestion acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResponse {
    pub analysis_id: Uuid,

    pub status: IngestionStatus,

    /// Rollup partitions written, when ingested inline
    pub records_written: Option<usize>,

    /// Facets whose write failed, when ingested inline
    #[serde(default)]
    #[schema(example = json!(["language"]))]
    pub failed_facets: Vec<String>,
}

impl IngestionResponse {
    pub fn queued(analysis_id: Uuid) -> Self {
        Self {
            analysis_id,
            status: IngestionStatus::Queued,
            records_written: None,
            failed_facets: Vec::new(),
        }
    }

    fn from_report(report: &IngestionReport) -> Self {
        Self {
            analysis_id: report.analysis_id.as_uuid(),
            status: if report.is_complete() {
                IngestionStatus::Ingested
            } else if report.is_failed() {
                IngestionStatus::Failed
            } else {
                IngestionStatus::Partial
            },
            records_written: Some(report.records_written()),
            failed_facets: report
                .failed_facets()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl From<&IngestionOutcome> for IngestionResponse {
    fn from(outcome: &IngestionOutcome) -> Self {
        match outcome {
            IngestionOutcome::Ingested(report) => Self::from_report(report),
            IngestionOutcome::Duplicate { analysis_id } => Self {
                analysis_id: analysis_id.as_uuid(),
                status: IngestionStatus::Duplicate,
                records_written: Some(0),
                failed_facets: Vec::new(),
            },
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Health check timestamp
    pub timestamp: DateTime<Utc>,

    /// Ingestion queue state
    #[schema(example = json!({"ingestion": {"mode": "queued", "capacity": 256, "available": 256}}))]
    pub details: Option<serde_json::Value>,
}
