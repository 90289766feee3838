//! Analysis ingestion
//!
//! Writes the rollup deltas of one analysis, one independent write per
//! facet. A failed facet never affects the others and is never retried here.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::analysis::{AnalysisId, AnalysisResult};
use crate::domain::dashboard::{DashboardError, Facet, IDashboardRepository};

use super::aggregation::AnalysisAggregator;

/// Per-facet outcome of one ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub analysis_id: AnalysisId,
    pub by_author: Result<usize, DashboardError>,
    pub by_language: Result<usize, DashboardError>,
    pub by_repository: Result<usize, DashboardError>,
    pub by_time: Result<usize, DashboardError>,
}

impl IngestionReport {
    pub fn result(&self, facet: Facet) -> &Result<usize, DashboardError> {
        match facet {
            Facet::Author => &self.by_author,
            Facet::Language => &self.by_language,
            Facet::Repository => &self.by_repository,
            Facet::Time => &self.by_time,
        }
    }

    /// Facets whose write failed, in facet order
    pub fn failed_facets(&self) -> Vec<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| self.result(*facet).is_err())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_facets().is_empty()
    }

    /// No facet was written
    pub fn is_failed(&self) -> bool {
        self.failed_facets().len() == Facet::ALL.len()
    }

    /// Records written across the successful facets
    pub fn records_written(&self) -> usize {
        Facet::ALL
            .iter()
            .filter_map(|facet| self.result(*facet).as_ref().ok())
            .sum()
    }
}

/// What happened to an analysis handed to the writer
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionOutcome {
    Ingested(IngestionReport),
    /// Already ingested and duplicates are skipped
    Duplicate { analysis_id: AnalysisId },
}

/// Use case for turning analyses into stored rollups
pub struct IngestAnalysisUseCase {
    dashboard_repository: Arc<dyn IDashboardRepository>,
    aggregator: AnalysisAggregator,
    skip_duplicates: bool,
}

impl IngestAnalysisUseCase {
    pub fn new(
        dashboard_repository: Arc<dyn IDashboardRepository>,
        aggregator: AnalysisAggregator,
    ) -> Self {
        Self {
            dashboard_repository,
            aggregator,
            skip_duplicates: false,
        }
    }

    /// Skip analyses the store has already seen instead of adding them again
    pub fn skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }

    /// Ingest every facet of a finished analysis
    #[instrument(skip(self, analysis), fields(analysis_id = %analysis.id, workspace_id = %analysis.workspace_id))]
    pub async fn execute(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<IngestionOutcome, DashboardError> {
        if !analysis.is_finished() {
            return Err(DashboardError::invalid_analysis(format!(
                "Analysis {} is still {}",
                analysis.id, analysis.status
            )));
        }

        if self.skip_duplicates {
            let first_seen = self
                .dashboard_repository
                .record_ingestion(&analysis.id, &analysis.workspace_id, &analysis.repository_id)
                .await?;
            if !first_seen {
                info!("Skipping analysis that was already ingested");
                return Ok(IngestionOutcome::Duplicate {
                    analysis_id: analysis.id,
                });
            }
        }

        let (by_author, by_language, by_repository, by_time) = tokio::join!(
            self.add_vulnerabilities_by_author(analysis),
            self.add_vulnerabilities_by_language(analysis),
            self.add_vulnerabilities_by_repository(analysis),
            self.add_vulnerabilities_by_time(analysis),
        );

        let report = IngestionReport {
            analysis_id: analysis.id,
            by_author,
            by_language,
            by_repository,
            by_time,
        };

        for facet in report.failed_facets() {
            if let Err(e) = report.result(facet) {
                warn!(facet = %facet, error = %e, "Failed to write rollup facet");
            }
        }

        info!(
            records = report.records_written(),
            complete = report.is_complete(),
            findings = analysis.vulnerability_count(),
            "Ingested analysis"
        );

        Ok(IngestionOutcome::Ingested(report))
    }

    pub async fn add_vulnerabilities_by_author(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<usize, DashboardError> {
        let records = self.aggregator.by_author(analysis);
        self.dashboard_repository
            .upsert_vulnerabilities_by_author(&records)
            .await
    }

    pub async fn add_vulnerabilities_by_language(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<usize, DashboardError> {
        let records = self.aggregator.by_language(analysis);
        self.dashboard_repository
            .upsert_vulnerabilities_by_language(&records)
            .await
    }

    pub async fn add_vulnerabilities_by_repository(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<usize, DashboardError> {
        let records = self.aggregator.by_repository(analysis);
        self.dashboard_repository
            .upsert_vulnerabilities_by_repository(&records)
            .await
    }

    pub async fn add_vulnerabilities_by_time(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<usize, DashboardError> {
        let records = self.aggregator.by_time(analysis);
        self.dashboard_repository
            .upsert_vulnerabilities_by_time(&records)
            .await
    }
}
