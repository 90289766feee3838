//! Common test utilities for vulnera-analytic-api

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use vulnera_analytic_api::infrastructure::{IngestionQueueHandle, QueuedAnalysis};
use vulnera_analytic_api::presentation::{AnalyticState, create_router};
use vulnera_analytic_core::application::dashboard::{
    AnalysisAggregator, GetDashboardChartsUseCase, IngestAnalysisUseCase,
};
use vulnera_analytic_core::config::ServerConfig;
use vulnera_analytic_core::domain::analysis::{AnalysisId, RepositoryId, WorkspaceId};
use vulnera_analytic_core::domain::dashboard::{
    DashboardError, DashboardFilter, IDashboardRepository, VulnerabilitiesByAuthor,
    VulnerabilitiesByLanguage, VulnerabilitiesByRepository, VulnerabilitiesByTime,
    VulnerabilityCounters,
};
use vulnera_analytic_core::infrastructure::InMemoryDashboardRepository;

/// Store whose every operation fails like an unreachable database
pub struct UnavailableDashboardRepository;

fn unavailable() -> DashboardError {
    DashboardError::DatabaseError {
        message: "connection refused".to_string(),
    }
}

#[async_trait]
impl IDashboardRepository for UnavailableDashboardRepository {
    async fn total_developers(&self, _filter: &DashboardFilter) -> Result<u64, DashboardError> {
        Err(unavailable())
    }

    async fn total_repositories(&self, _filter: &DashboardFilter) -> Result<u64, DashboardError> {
        Err(unavailable())
    }

    async fn vulnerabilities_by_severity(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError> {
        Err(unavailable())
    }

    async fn vulnerabilities_by_author(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError> {
        Err(unavailable())
    }

    async fn vulnerabilities_by_language(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError> {
        Err(unavailable())
    }

    async fn vulnerabilities_by_repository(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError> {
        Err(unavailable())
    }

    async fn vulnerabilities_by_time(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError> {
        Err(unavailable())
    }

    async fn upsert_vulnerabilities_by_author(
        &self,
        _records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError> {
        Err(unavailable())
    }

    async fn upsert_vulnerabilities_by_language(
        &self,
        _records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError> {
        Err(unavailable())
    }

    async fn upsert_vulnerabilities_by_repository(
        &self,
        _records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError> {
        Err(unavailable())
    }

    async fn upsert_vulnerabilities_by_time(
        &self,
        _records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError> {
        Err(unavailable())
    }

    async fn record_ingestion(
        &self,
        _analysis_id: &AnalysisId,
        _workspace_id: &WorkspaceId,
        _repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError> {
        Err(unavailable())
    }
}

/// Memory store whose language upserts fail; everything else is delegated
#[derive(Default)]
pub struct LanguageWriteFailingRepository {
    inner: InMemoryDashboardRepository,
}

#[async_trait]
impl IDashboardRepository for LanguageWriteFailingRepository {
    async fn total_developers(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.inner.total_developers(filter).await
    }

    async fn total_repositories(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.inner.total_repositories(filter).await
    }

    async fn vulnerabilities_by_severity(
        &self,
        filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError> {
        self.inner.vulnerabilities_by_severity(filter).await
    }

    async fn vulnerabilities_by_author(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError> {
        self.inner.vulnerabilities_by_author(filter).await
    }

    async fn vulnerabilities_by_language(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError> {
        self.inner.vulnerabilities_by_language(filter).await
    }

    async fn vulnerabilities_by_repository(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError> {
        self.inner.vulnerabilities_by_repository(filter).await
    }

    async fn vulnerabilities_by_time(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError> {
        self.inner.vulnerabilities_by_time(filter).await
    }

    async fn upsert_vulnerabilities_by_author(
        &self,
        records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError> {
        self.inner.upsert_vulnerabilities_by_author(records).await
    }

    async fn upsert_vulnerabilities_by_language(
        &self,
        _records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError> {
        Err(unavailable())
    }

    async fn upsert_vulnerabilities_by_repository(
        &self,
        records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError> {
        self.inner.upsert_vulnerabilities_by_repository(records).await
    }

    async fn upsert_vulnerabilities_by_time(
        &self,
        records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError> {
        self.inner.upsert_vulnerabilities_by_time(records).await
    }

    async fn record_ingestion(
        &self,
        analysis_id: &AnalysisId,
        workspace_id: &WorkspaceId,
        repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError> {
        self.inner
            .record_ingestion(analysis_id, workspace_id, repository_id)
            .await
    }
}

/// State over the given store with inline ingestion
pub fn state_for(repository: Arc<dyn IDashboardRepository>) -> AnalyticState {
    AnalyticState {
        get_dashboard_charts_use_case: Arc::new(GetDashboardChartsUseCase::new(
            repository.clone(),
        )),
        ingest_analysis_use_case: Arc::new(IngestAnalysisUseCase::new(
            repository,
            AnalysisAggregator::default(),
        )),
        ingestion_queue: None,
        max_page_size: 100,
    }
}

/// Same state with a queue nobody drains, so enqueued analyses stay observable
pub fn queued_state_for(
    repository: Arc<dyn IDashboardRepository>,
    capacity: usize,
) -> (AnalyticState, mpsc::Receiver<QueuedAnalysis>) {
    let (queue, receiver) = IngestionQueueHandle::channel(capacity);
    let mut state = state_for(repository);
    state.ingestion_queue = Some(queue);
    (state, receiver)
}

pub fn router(state: AnalyticState) -> Router {
    create_router(state, &ServerConfig::default())
}

/// Wire payload of a finished analysis with one finding per email
pub fn analysis_payload(workspace_id: WorkspaceId, emails: &[&str]) -> Value {
    let analysis_id = uuid::Uuid::new_v4();
    let findings: Vec<Value> = emails
        .iter()
        .map(|email| {
            json!({
                "vulnerabilityID": uuid::Uuid::new_v4(),
                "analysisID": analysis_id,
                "createdAt": "2021-03-31T10:58:42Z",
                "vulnerability": {
                    "vulnerabilityID": uuid::Uuid::new_v4(),
                    "line": "1",
                    "column": "0",
                    "confidence": "HIGH",
                    "file": "/deployments/cert.pem",
                    "code": "-----BEGIN CERTIFICATE-----",
                    "details": "Asymmetric Private Key",
                    "securityTool": "HorusecEngine",
                    "language": "Leaks",
                    "severity": "CRITICAL",
                    "type": "Vulnerability",
                    "commitEmail": email,
                    "commitAuthor": "Horusec"
                }
            })
        })
        .collect();

    json!({
        "id": analysis_id,
        "repositoryID": uuid::Uuid::new_v4(),
        "repositoryName": "my-repository",
        "workspaceID": workspace_id.as_uuid(),
        "workspaceName": "my-workspace",
        "status": "success",
        "errors": "",
        "createdAt": "2021-03-31T10:58:42Z",
        "finishedAt": "2021-03-31T11:00:00Z",
        "analysisVulnerabilities": findings
    })
}
