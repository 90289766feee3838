//! Dashboard repository traits

use async_trait::async_trait;

use crate::domain::analysis::{AnalysisId, RepositoryId, WorkspaceId};

use super::entities::{
    VulnerabilitiesByAuthor, VulnerabilitiesByLanguage, VulnerabilitiesByRepository,
    VulnerabilitiesByTime, VulnerabilityCounters,
};
use super::errors::DashboardError;
use super::value_objects::DashboardFilter;

/// Rollup store for dashboard aggregates
///
/// Reads merge every stored partition inside the filter's scope. Grouped
/// reads are ordered by total count descending, ties broken by key
/// ascending; by-time is ordered by bucket ascending and never paginated.
/// Writes merge counters additively into existing rows.
#[async_trait]
pub trait IDashboardRepository: Send + Sync {
    /// Count distinct commit authors
    async fn total_developers(&self, filter: &DashboardFilter) -> Result<u64, DashboardError>;

    /// Count distinct repositories
    async fn total_repositories(&self, filter: &DashboardFilter) -> Result<u64, DashboardError>;

    /// Sum every counter in scope
    async fn vulnerabilities_by_severity(
        &self,
        filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError>;

    async fn vulnerabilities_by_author(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError>;

    async fn vulnerabilities_by_language(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError>;

    async fn vulnerabilities_by_repository(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError>;

    async fn vulnerabilities_by_time(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError>;

    /// Merge by-author rollups, returning the number of records written
    async fn upsert_vulnerabilities_by_author(
        &self,
        records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError>;

    /// Merge by-language rollups, returning the number of records written
    async fn upsert_vulnerabilities_by_language(
        &self,
        records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError>;

    /// Merge by-repository rollups, returning the number of records written
    async fn upsert_vulnerabilities_by_repository(
        &self,
        records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError>;

    /// Merge by-time rollups, returning the number of records written
    async fn upsert_vulnerabilities_by_time(
        &self,
        records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError>;

    /// Remember that an analysis was ingested.
    ///
    /// Returns `true` the first time an id is seen and `false` afterwards.
    async fn record_ingestion(
        &self,
        analysis_id: &AnalysisId,
        workspace_id: &WorkspaceId,
        repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError>;
}
