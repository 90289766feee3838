//! Scripted rollup store used by the use case tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use vulnera_analytic_core::domain::analysis::{AnalysisId, RepositoryId, WorkspaceId};
use vulnera_analytic_core::domain::dashboard::{
    DashboardError, DashboardFilter, IDashboardRepository, VulnerabilitiesByAuthor,
    VulnerabilitiesByLanguage, VulnerabilitiesByRepository, VulnerabilitiesByTime,
    VulnerabilityCounters,
};

/// Operations of the rollup store, as seen by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    TotalDevelopers,
    TotalRepositories,
    BySeverity,
    ByAuthor,
    ByRepository,
    ByLanguage,
    ByTime,
    UpsertByAuthor,
    UpsertByLanguage,
    UpsertByRepository,
    UpsertByTime,
    RecordIngestion,
}

/// Mock store that fails on the scripted calls and records every call it sees
pub struct MockDashboardRepository {
    pub failing: HashSet<StoreCall>,
    pub calls: Arc<Mutex<Vec<StoreCall>>>,
    pub captured_authors: Arc<Mutex<Vec<VulnerabilitiesByAuthor>>>,
    pub seen_analyses: Arc<Mutex<HashSet<AnalysisId>>>,
    pub developers: u64,
    pub repositories: u64,
}

impl MockDashboardRepository {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            captured_authors: Arc::new(Mutex::new(Vec::new())),
            seen_analyses: Arc::new(Mutex::new(HashSet::new())),
            developers: 3,
            repositories: 2,
        }
    }

    pub fn failing_on(mut self, call: StoreCall) -> Self {
        self.failing.insert(call);
        self
    }

    pub async fn recorded_calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: StoreCall) -> Result<(), DashboardError> {
        self.calls.lock().await.push(call);
        if self.failing.contains(&call) {
            return Err(DashboardError::DatabaseError {
                message: format!("{:?} failed", call),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IDashboardRepository for MockDashboardRepository {
    async fn total_developers(&self, _filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.enter(StoreCall::TotalDevelopers).await?;
        Ok(self.developers)
    }

    async fn total_repositories(&self, _filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.enter(StoreCall::TotalRepositories).await?;
        Ok(self.repositories)
    }

    async fn vulnerabilities_by_severity(
        &self,
        filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError> {
        self.enter(StoreCall::BySeverity).await?;
        Ok(VulnerabilityCounters::new(
            filter.workspace_id,
            filter.repository_id,
        ))
    }

    async fn vulnerabilities_by_author(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError> {
        self.enter(StoreCall::ByAuthor).await?;
        Ok(self.captured_authors.lock().await.clone())
    }

    async fn vulnerabilities_by_language(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError> {
        self.enter(StoreCall::ByLanguage).await?;
        Ok(Vec::new())
    }

    async fn vulnerabilities_by_repository(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError> {
        self.enter(StoreCall::ByRepository).await?;
        Ok(Vec::new())
    }

    async fn vulnerabilities_by_time(
        &self,
        _filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError> {
        self.enter(StoreCall::ByTime).await?;
        Ok(Vec::new())
    }

    async fn upsert_vulnerabilities_by_author(
        &self,
        records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError> {
        self.enter(StoreCall::UpsertByAuthor).await?;
        self.captured_authors
            .lock()
            .await
            .extend(records.iter().cloned());
        Ok(records.len())
    }

    async fn upsert_vulnerabilities_by_language(
        &self,
        records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError> {
        self.enter(StoreCall::UpsertByLanguage).await?;
        Ok(records.len())
    }

    async fn upsert_vulnerabilities_by_repository(
        &self,
        records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError> {
        self.enter(StoreCall::UpsertByRepository).await?;
        Ok(records.len())
    }

    async fn upsert_vulnerabilities_by_time(
        &self,
        records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError> {
        self.enter(StoreCall::UpsertByTime).await?;
        Ok(records.len())
    }

    async fn record_ingestion(
        &self,
        analysis_id: &AnalysisId,
        _workspace_id: &WorkspaceId,
        _repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError> {
        self.enter(StoreCall::RecordIngestion).await?;
        Ok(self.seen_analyses.lock().await.insert(*analysis_id))
    }
}
