//! In-memory dashboard rollup store
//!
//! Keeps the same partition layout as the PostgreSQL tables so reads and
//! writes behave identically. Used for local development and tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::analysis::{AnalysisId, RepositoryId, WorkspaceId};
use crate::domain::dashboard::{
    DashboardError, DashboardFilter, Facet, IDashboardRepository, RollupRecord,
    VulnerabilitiesByAuthor, VulnerabilitiesByLanguage, VulnerabilitiesByRepository,
    VulnerabilitiesByTime, VulnerabilityCounters,
};

use super::{PartitionKey, partition_key};

type Partitions<R> = BTreeMap<PartitionKey<<R as RollupRecord>::Group>, R>;

#[derive(Default)]
struct MemoryState {
    by_author: Partitions<VulnerabilitiesByAuthor>,
    by_language: Partitions<VulnerabilitiesByLanguage>,
    by_repository: Partitions<VulnerabilitiesByRepository>,
    by_time: Partitions<VulnerabilitiesByTime>,
    ingested: HashSet<AnalysisId>,
}

/// Process-local rollup store guarded by an async read/write lock
#[derive(Default)]
pub struct InMemoryDashboardRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryDashboardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn upsert_into<R: RollupRecord>(
    partitions: &mut Partitions<R>,
    records: &[R],
) -> Result<usize, DashboardError> {
    // Validate every record before touching the map so a bad batch writes nothing
    let keyed = records
        .iter()
        .map(|record| partition_key(record).map(|key| (key, record)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut touched = BTreeSet::new();
    for (key, record) in keyed {
        match partitions.get_mut(&key) {
            Some(existing) => existing.absorb(record),
            None => {
                let mut fresh = record.clone();
                fresh.vulnerability_mut().active = true;
                partitions.insert(key.clone(), fresh);
            }
        }
        touched.insert(key);
    }

    Ok(touched.len())
}

/// Merge every partition in scope by group and order the result
fn read_grouped<R: RollupRecord>(partitions: &Partitions<R>, filter: &DashboardFilter) -> Vec<R> {
    let mut groups: BTreeMap<R::Group, R> = BTreeMap::new();

    for ((workspace_id, repository_id, _, day), record) in partitions {
        if !filter.matches(workspace_id, repository_id, *day) {
            continue;
        }

        let mut scoped = record.clone();
        if R::FACET != Facet::Repository {
            scoped.vulnerability_mut().repository_id = filter.repository_id;
        }

        match groups.get_mut(&scoped.group()) {
            Some(existing) => existing.absorb(&scoped),
            None => {
                groups.insert(scoped.group(), scoped);
            }
        }
    }

    let mut records: Vec<R> = groups.into_values().collect();

    if R::FACET == Facet::Time {
        records.sort_by_key(|record| record.group());
        return records;
    }

    records.sort_by(|a, b| {
        b.vulnerability()
            .total()
            .cmp(&a.vulnerability().total())
            .then_with(|| a.group().cmp(&b.group()))
    });

    match filter.pagination {
        Some(pagination) => pagination.apply(records),
        None => records,
    }
}

#[async_trait]
impl IDashboardRepository for InMemoryDashboardRepository {
    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn total_developers(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        let state = self.state.read().await;
        let authors: BTreeSet<&String> = state
            .by_author
            .iter()
            .filter(|((ws, repo, _, day), _)| filter.matches(ws, repo, *day))
            .map(|((_, _, author, _), _)| author)
            .collect();
        Ok(authors.len() as u64)
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn total_repositories(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        let state = self.state.read().await;
        let repositories: BTreeSet<&RepositoryId> = state
            .by_repository
            .keys()
            .filter(|(ws, repo, _, day)| filter.matches(ws, repo, *day))
            .map(|(_, repo, _, _)| repo)
            .collect();
        Ok(repositories.len() as u64)
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_severity(
        &self,
        filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError> {
        let state = self.state.read().await;
        let mut totals = VulnerabilityCounters::new(filter.workspace_id, filter.repository_id);
        for ((ws, repo, _, day), record) in &state.by_repository {
            if filter.matches(ws, repo, *day) {
                totals.merge(record.vulnerability());
            }
        }
        Ok(totals)
    }

    async fn vulnerabilities_by_author(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError> {
        Ok(read_grouped(&self.state.read().await.by_author, filter))
    }

    async fn vulnerabilities_by_language(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError> {
        Ok(read_grouped(&self.state.read().await.by_language, filter))
    }

    async fn vulnerabilities_by_repository(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError> {
        Ok(read_grouped(&self.state.read().await.by_repository, filter))
    }

    async fn vulnerabilities_by_time(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError> {
        Ok(read_grouped(&self.state.read().await.by_time, filter))
    }

    async fn upsert_vulnerabilities_by_author(
        &self,
        records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError> {
        upsert_into(&mut self.state.write().await.by_author, records)
    }

    async fn upsert_vulnerabilities_by_language(
        &self,
        records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError> {
        upsert_into(&mut self.state.write().await.by_language, records)
    }

    async fn upsert_vulnerabilities_by_repository(
        &self,
        records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError> {
        upsert_into(&mut self.state.write().await.by_repository, records)
    }

    async fn upsert_vulnerabilities_by_time(
        &self,
        records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError> {
        upsert_into(&mut self.state.write().await.by_time, records)
    }

    async fn record_ingestion(
        &self,
        analysis_id: &AnalysisId,
        _workspace_id: &WorkspaceId,
        _repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError> {
        Ok(self.state.write().await.ingested.insert(*analysis_id))
    }
}
