//! Rollup store implementations

pub mod memory_repository;
pub mod postgres_repository;

pub use memory_repository::InMemoryDashboardRepository;
pub use postgres_repository::SqlxDashboardRepository;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::analysis::{RepositoryId, WorkspaceId};
use crate::domain::dashboard::{DashboardError, RollupRecord};

/// Storage identity of a rollup row: scope, facet key and analysis day
pub(crate) type PartitionKey<G> = (WorkspaceId, RepositoryId, G, NaiveDate);

pub(crate) fn partition_key<R: RollupRecord>(
    record: &R,
) -> Result<PartitionKey<R::Group>, DashboardError> {
    let counters = record.vulnerability();
    let repository_id = counters.repository_id.ok_or_else(|| DashboardError::InternalError {
        message: format!("{} rollup is missing its repository id", R::FACET),
    })?;

    Ok((
        counters.workspace_id,
        repository_id,
        record.group(),
        record.created_at().date_naive(),
    ))
}

/// Merge records that land on the same partition, keeping first-seen order
pub(crate) fn coalesce_partitions<R: RollupRecord>(
    records: &[R],
) -> Result<Vec<(PartitionKey<R::Group>, R)>, DashboardError> {
    let mut merged: Vec<(PartitionKey<R::Group>, R)> = Vec::with_capacity(records.len());
    let mut positions: HashMap<PartitionKey<R::Group>, usize> = HashMap::new();

    for record in records {
        let key = partition_key(record)?;
        match positions.get(&key) {
            Some(position) => merged[*position].1.absorb(record),
            None => {
                positions.insert(key.clone(), merged.len());
                merged.push((key, record.clone()));
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{Severity, VulnerabilityType};
    use crate::domain::dashboard::{VulnerabilitiesByLanguage, VulnerabilityCounters};
    use chrono::Utc;

    fn record(language: &str, repository_id: Option<RepositoryId>) -> VulnerabilitiesByLanguage {
        let mut vulnerability = VulnerabilityCounters::new(WorkspaceId::generate(), repository_id);
        vulnerability.record(Severity::High, VulnerabilityType::Vulnerability);
        VulnerabilitiesByLanguage {
            language: language.to_string(),
            vulnerability,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_coalesce_merges_same_partition() {
        let first = record("Go", Some(RepositoryId::generate()));
        let duplicate = first.clone();
        let mut other = first.clone();
        other.language = "Rust".to_string();

        let merged = coalesce_partitions(&[first, other, duplicate]).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].1.language, "Go");
        assert_eq!(merged[0].1.vulnerability.high.vulnerability, 2);
        assert_eq!(merged[1].1.language, "Rust");
    }

    #[test]
    fn test_partition_requires_repository() {
        let err = partition_key(&record("Go", None)).unwrap_err();
        assert!(matches!(err, DashboardError::InternalError { .. }));
    }
}
