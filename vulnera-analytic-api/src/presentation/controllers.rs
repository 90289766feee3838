//! Analytic API controllers

pub mod dashboard;
pub mod health;
pub mod ingestion;

use std::sync::Arc;

use vulnera_analytic_core::application::dashboard::{
    GetDashboardChartsUseCase, IngestAnalysisUseCase,
};

use crate::infrastructure::IngestionQueueHandle;

/// Application state for the analytic API
#[derive(Clone)]
pub struct AnalyticState {
    pub get_dashboard_charts_use_case: Arc<GetDashboardChartsUseCase>,
    pub ingest_analysis_use_case: Arc<IngestAnalysisUseCase>,
    /// Present when the background worker runs; analyses are ingested inline otherwise
    pub ingestion_queue: Option<IngestionQueueHandle>,
    pub max_page_size: u32,
}
