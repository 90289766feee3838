//! SQLx implementation of the dashboard rollup store
//!
//! Each facet lives in its own table, one row per (scope, key, analysis day).
//! Writes add to existing counters through `ON CONFLICT ... DO UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::analysis::{AnalysisId, RepositoryId, Severity, VulnerabilityType, WorkspaceId};
use crate::domain::dashboard::{
    DashboardError, DashboardFilter, IDashboardRepository, RollupRecord, VulnerabilitiesByAuthor,
    VulnerabilitiesByLanguage, VulnerabilitiesByRepository, VulnerabilitiesByTime,
    VulnerabilityCounters,
};

use super::coalesce_partitions;

/// Rows per INSERT statement; keeps bind parameters well under the protocol limit
const UPSERT_CHUNK_SIZE: usize = 500;

/// Counter columns shared by every rollup table
const COUNTER_COLUMNS: [(Severity, VulnerabilityType, &str); 24] = [
    (Severity::Critical, VulnerabilityType::Vulnerability, "critical_vulnerability"),
    (Severity::Critical, VulnerabilityType::RiskAccepted, "critical_risk_accepted"),
    (Severity::Critical, VulnerabilityType::FalsePositive, "critical_false_positive"),
    (Severity::Critical, VulnerabilityType::Corrected, "critical_corrected"),
    (Severity::High, VulnerabilityType::Vulnerability, "high_vulnerability"),
    (Severity::High, VulnerabilityType::RiskAccepted, "high_risk_accepted"),
    (Severity::High, VulnerabilityType::FalsePositive, "high_false_positive"),
    (Severity::High, VulnerabilityType::Corrected, "high_corrected"),
    (Severity::Medium, VulnerabilityType::Vulnerability, "medium_vulnerability"),
    (Severity::Medium, VulnerabilityType::RiskAccepted, "medium_risk_accepted"),
    (Severity::Medium, VulnerabilityType::FalsePositive, "medium_false_positive"),
    (Severity::Medium, VulnerabilityType::Corrected, "medium_corrected"),
    (Severity::Low, VulnerabilityType::Vulnerability, "low_vulnerability"),
    (Severity::Low, VulnerabilityType::RiskAccepted, "low_risk_accepted"),
    (Severity::Low, VulnerabilityType::FalsePositive, "low_false_positive"),
    (Severity::Low, VulnerabilityType::Corrected, "low_corrected"),
    (Severity::Info, VulnerabilityType::Vulnerability, "info_vulnerability"),
    (Severity::Info, VulnerabilityType::RiskAccepted, "info_risk_accepted"),
    (Severity::Info, VulnerabilityType::FalsePositive, "info_false_positive"),
    (Severity::Info, VulnerabilityType::Corrected, "info_corrected"),
    (Severity::Unknown, VulnerabilityType::Vulnerability, "unknown_vulnerability"),
    (Severity::Unknown, VulnerabilityType::RiskAccepted, "unknown_risk_accepted"),
    (Severity::Unknown, VulnerabilityType::FalsePositive, "unknown_false_positive"),
    (Severity::Unknown, VulnerabilityType::Corrected, "unknown_corrected"),
];

/// Table layout of one facet
struct FacetTable {
    name: &'static str,
    /// Facet key columns written alongside the scope columns
    key_columns: &'static [&'static str],
    /// Columns a grouped read merges partitions by
    group_columns: &'static [&'static str],
    order_by: &'static str,
    paginated: bool,
}

const BY_AUTHOR: FacetTable = FacetTable {
    name: "vulnerabilities_by_author",
    key_columns: &["author"],
    group_columns: &["author"],
    order_by: "total DESC, author ASC",
    paginated: true,
};

const BY_LANGUAGE: FacetTable = FacetTable {
    name: "vulnerabilities_by_language",
    key_columns: &["language"],
    group_columns: &["language"],
    order_by: "total DESC, language ASC",
    paginated: true,
};

const BY_REPOSITORY: FacetTable = FacetTable {
    name: "vulnerabilities_by_repository",
    key_columns: &["repository_name"],
    group_columns: &["repository_id", "repository_name"],
    order_by: "total DESC, repository_name ASC, repository_id ASC",
    paginated: true,
};

const BY_TIME: FacetTable = FacetTable {
    name: "vulnerabilities_by_time",
    key_columns: &["bucket"],
    group_columns: &["bucket"],
    order_by: "bucket ASC",
    paginated: false,
};

/// Facet-specific row mapping
trait PgRollup: RollupRecord {
    const TABLE: FacetTable;

    /// Bind the values of `TABLE.key_columns`, in order
    fn push_key(&self, row: &mut Separated<'_, '_, Postgres, &'static str>);

    /// Build a record from a grouped row and its already decoded counters
    fn from_row(row: &PgRow, vulnerability: VulnerabilityCounters) -> Result<Self, sqlx::Error>;
}

impl PgRollup for VulnerabilitiesByAuthor {
    const TABLE: FacetTable = BY_AUTHOR;

    fn push_key(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.author.clone());
    }

    fn from_row(row: &PgRow, vulnerability: VulnerabilityCounters) -> Result<Self, sqlx::Error> {
        Ok(Self {
            author: row.try_get("author")?,
            vulnerability,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl PgRollup for VulnerabilitiesByLanguage {
    const TABLE: FacetTable = BY_LANGUAGE;

    fn push_key(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.language.clone());
    }

    fn from_row(row: &PgRow, vulnerability: VulnerabilityCounters) -> Result<Self, sqlx::Error> {
        Ok(Self {
            language: row.try_get("language")?,
            vulnerability,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl PgRollup for VulnerabilitiesByRepository {
    const TABLE: FacetTable = BY_REPOSITORY;

    fn push_key(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.repository_name.clone());
    }

    fn from_row(
        row: &PgRow,
        mut vulnerability: VulnerabilityCounters,
    ) -> Result<Self, sqlx::Error> {
        let repository_id: Uuid = row.try_get("repository_id")?;
        vulnerability.repository_id = Some(RepositoryId::from(repository_id));

        Ok(Self {
            repository_name: row.try_get("repository_name")?,
            vulnerability,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl PgRollup for VulnerabilitiesByTime {
    const TABLE: FacetTable = BY_TIME;

    fn push_key(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.time);
    }

    fn from_row(row: &PgRow, vulnerability: VulnerabilityCounters) -> Result<Self, sqlx::Error> {
        Ok(Self {
            time: row.try_get("bucket")?,
            vulnerability,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn map_db_error(operation: &str, e: sqlx::Error) -> DashboardError {
    tracing::error!("Database error {}: {}", operation, e);
    DashboardError::DatabaseError {
        message: e.to_string(),
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, filter: &DashboardFilter) {
    builder
        .push(" WHERE workspace_id = ")
        .push_bind(filter.workspace_id.as_uuid());

    if let Some(repository_id) = filter.repository_id {
        builder
            .push(" AND repository_id = ")
            .push_bind(repository_id.as_uuid());
    }

    if let Some(range) = filter.date_range {
        builder
            .push(" AND analysis_date BETWEEN ")
            .push_bind(range.initial_day())
            .push(" AND ")
            .push_bind(range.final_day());
    }
}

/// `COALESCE(SUM(col), 0)::BIGINT AS col, ...` plus the grand total
fn push_counter_sums(builder: &mut QueryBuilder<'_, Postgres>) {
    for (_, _, column) in COUNTER_COLUMNS {
        builder.push(format!("COALESCE(SUM({column}), 0)::BIGINT AS {column}, "));
    }

    let total = COUNTER_COLUMNS
        .iter()
        .map(|(_, _, column)| *column)
        .collect::<Vec<_>>()
        .join(" + ");
    builder.push(format!("COALESCE(SUM({total}), 0)::BIGINT AS total"));
}

fn counters_from_row(
    row: &PgRow,
    workspace_id: WorkspaceId,
    repository_id: Option<RepositoryId>,
) -> Result<VulnerabilityCounters, sqlx::Error> {
    let mut counters = VulnerabilityCounters::new(workspace_id, repository_id);
    for (severity, vuln_type, column) in COUNTER_COLUMNS {
        let value: i64 = row.try_get(column)?;
        *counters.for_severity_mut(severity).get_mut(vuln_type) = value.max(0) as u64;
    }
    Ok(counters)
}

/// SQLx implementation of the dashboard rollup store
pub struct SqlxDashboardRepository {
    pool: Arc<PgPool>,
}

impl SqlxDashboardRepository {
    /// Create a new SQLx dashboard repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn count_distinct(
        &self,
        table: &FacetTable,
        column: &str,
        filter: &DashboardFilter,
    ) -> Result<u64, DashboardError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(DISTINCT {}) FROM {}",
            column, table.name
        ));
        push_scope(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_db_error(&format!("counting {} in {}", column, table.name), e))?;

        Ok(count.max(0) as u64)
    }

    async fn fetch_grouped<R: PgRollup>(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<R>, DashboardError> {
        let table = R::TABLE;
        let group_columns = table.group_columns.join(", ");

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}, MAX(created_at) AS created_at, ",
            group_columns
        ));
        push_counter_sums(&mut builder);
        builder.push(format!(" FROM {}", table.name));
        push_scope(&mut builder, filter);
        builder.push(format!(
            " GROUP BY {} ORDER BY {}",
            group_columns, table.order_by
        ));

        if table.paginated {
            if let Some(pagination) = filter.pagination {
                builder
                    .push(" LIMIT ")
                    .push_bind(i64::from(pagination.size()))
                    .push(" OFFSET ")
                    .push_bind(pagination.offset() as i64);
            }
        }

        let rows = builder
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_db_error(&format!("reading {}", table.name), e))?;

        rows.iter()
            .map(|row| {
                let counters = counters_from_row(row, filter.workspace_id, filter.repository_id)?;
                R::from_row(row, counters)
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_db_error(&format!("decoding {}", table.name), e))
    }

    async fn upsert<R: PgRollup>(&self, records: &[R]) -> Result<usize, DashboardError> {
        if records.is_empty() {
            return Ok(0);
        }

        let table = R::TABLE;
        let partitions = coalesce_partitions(records)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting rollup transaction", e))?;

        for chunk in partitions.chunks(UPSERT_CHUNK_SIZE) {
            let mut builder = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO {} (workspace_id, repository_id, {}, analysis_date, active, {}, created_at) ",
                table.name,
                table.key_columns.join(", "),
                COUNTER_COLUMNS
                    .iter()
                    .map(|(_, _, column)| *column)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));

            builder.push_values(chunk, |mut row, ((workspace_id, repository_id, _, day), record)| {
                row.push_bind(workspace_id.as_uuid())
                    .push_bind(repository_id.as_uuid());
                record.push_key(&mut row);
                row.push_bind(*day).push_bind(true);

                let counters = record.vulnerability();
                for (severity, vuln_type, _) in COUNTER_COLUMNS {
                    row.push_bind(counters.get(severity, vuln_type) as i64);
                }
                row.push_bind(record.created_at());
            });

            let conflict_target = ["workspace_id", "repository_id"]
                .iter()
                .chain(table.key_columns.iter())
                .chain(["analysis_date"].iter())
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            let increments = COUNTER_COLUMNS
                .iter()
                .map(|(_, _, column)| format!("{column} = {}.{column} + EXCLUDED.{column}", table.name))
                .collect::<Vec<_>>()
                .join(", ");

            builder.push(format!(
                " ON CONFLICT ({}) DO UPDATE SET {}, created_at = GREATEST({}.created_at, EXCLUDED.created_at), updated_at = NOW()",
                conflict_target, increments, table.name
            ));

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error(&format!("upserting {}", table.name), e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("committing rollup transaction", e))?;

        debug!(table = table.name, rows = partitions.len(), "Upserted rollups");
        Ok(partitions.len())
    }
}

#[async_trait]
impl IDashboardRepository for SqlxDashboardRepository {
    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn total_developers(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.count_distinct(&BY_AUTHOR, "author", filter).await
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn total_repositories(&self, filter: &DashboardFilter) -> Result<u64, DashboardError> {
        self.count_distinct(&BY_REPOSITORY, "repository_id", filter)
            .await
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_severity(
        &self,
        filter: &DashboardFilter,
    ) -> Result<VulnerabilityCounters, DashboardError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        push_counter_sums(&mut builder);
        builder.push(format!(" FROM {}", BY_REPOSITORY.name));
        push_scope(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_db_error("reading severity totals", e))?;

        counters_from_row(&row, filter.workspace_id, filter.repository_id)
            .map_err(|e| map_db_error("decoding severity totals", e))
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_author(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByAuthor>, DashboardError> {
        self.fetch_grouped(filter).await
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_language(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByLanguage>, DashboardError> {
        self.fetch_grouped(filter).await
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_repository(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByRepository>, DashboardError> {
        self.fetch_grouped(filter).await
    }

    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id))]
    async fn vulnerabilities_by_time(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<VulnerabilitiesByTime>, DashboardError> {
        self.fetch_grouped(filter).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_vulnerabilities_by_author(
        &self,
        records: &[VulnerabilitiesByAuthor],
    ) -> Result<usize, DashboardError> {
        self.upsert(records).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_vulnerabilities_by_language(
        &self,
        records: &[VulnerabilitiesByLanguage],
    ) -> Result<usize, DashboardError> {
        self.upsert(records).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_vulnerabilities_by_repository(
        &self,
        records: &[VulnerabilitiesByRepository],
    ) -> Result<usize, DashboardError> {
        self.upsert(records).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_vulnerabilities_by_time(
        &self,
        records: &[VulnerabilitiesByTime],
    ) -> Result<usize, DashboardError> {
        self.upsert(records).await
    }

    #[instrument(skip(self), fields(analysis_id = %analysis_id))]
    async fn record_ingestion(
        &self,
        analysis_id: &AnalysisId,
        workspace_id: &WorkspaceId,
        repository_id: &RepositoryId,
    ) -> Result<bool, DashboardError> {
        let now: DateTime<Utc> = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO ingested_analyses (analysis_id, workspace_id, repository_id, ingested_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (analysis_id) DO NOTHING
            "#,
        )
        .bind(analysis_id.as_uuid())
        .bind(workspace_id.as_uuid())
        .bind(repository_id.as_uuid())
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_db_error("recording ingestion", e))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snake_case(vuln_type: VulnerabilityType) -> &'static str {
        match vuln_type {
            VulnerabilityType::Vulnerability => "vulnerability",
            VulnerabilityType::RiskAccepted => "risk_accepted",
            VulnerabilityType::FalsePositive => "false_positive",
            VulnerabilityType::Corrected => "corrected",
        }
    }

    #[test]
    fn test_counter_columns_cover_every_slot_once() {
        let mut expected = Vec::new();
        for severity in Severity::ALL {
            for vuln_type in VulnerabilityType::ALL {
                expected.push(format!(
                    "{}_{}",
                    severity.as_str().to_ascii_lowercase(),
                    snake_case(vuln_type)
                ));
            }
        }

        let actual: Vec<String> = COUNTER_COLUMNS
            .iter()
            .map(|(severity, vuln_type, column)| {
                assert_eq!(
                    *column,
                    format!(
                        "{}_{}",
                        severity.as_str().to_ascii_lowercase(),
                        snake_case(*vuln_type)
                    )
                );
                column.to_string()
            })
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_scope_binds_optional_filters() {
        let filter = DashboardFilter::for_workspace(WorkspaceId::generate())
            .with_repository(RepositoryId::generate());

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM t");
        push_scope(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM t WHERE workspace_id = $1 AND repository_id = $2"
        );
    }

    #[test]
    fn test_only_time_facet_is_unpaginated() {
        assert!(BY_AUTHOR.paginated);
        assert!(BY_LANGUAGE.paginated);
        assert!(BY_REPOSITORY.paginated);
        assert!(!BY_TIME.paginated);
    }
}
