//! Dashboard use cases
//!
//! Assembles the multi-chart dashboard from the rollup store.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::dashboard::{
    CHART_ORDER, DashboardChart, DashboardCharts, DashboardError, DashboardFilter,
    IDashboardRepository, VulnerabilitiesByAuthor, VulnerabilitiesByLanguage,
    VulnerabilitiesByRepository, VulnerabilitiesByTime, VulnerabilityCounters,
};

/// How the chart reads are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// One read at a time in chart order, stopping at the first failure
    #[default]
    Sequential,
    /// Every read in flight at once; the first failure drops the rest
    Concurrent,
}

/// Output of a single chart read
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    TotalDevelopers(u64),
    TotalRepositories(u64),
    BySeverity(VulnerabilityCounters),
    ByAuthor(Vec<VulnerabilitiesByAuthor>),
    ByRepository(Vec<VulnerabilitiesByRepository>),
    ByLanguage(Vec<VulnerabilitiesByLanguage>),
    ByTime(Vec<VulnerabilitiesByTime>),
}

#[derive(Default)]
struct ChartsBuilder {
    total_developers: Option<u64>,
    total_repositories: Option<u64>,
    vulnerability_by_severity: Option<VulnerabilityCounters>,
    vulnerabilities_by_author: Option<Vec<VulnerabilitiesByAuthor>>,
    vulnerabilities_by_repository: Option<Vec<VulnerabilitiesByRepository>>,
    vulnerabilities_by_language: Option<Vec<VulnerabilitiesByLanguage>>,
    vulnerabilities_by_time: Option<Vec<VulnerabilitiesByTime>>,
}

impl ChartsBuilder {
    fn apply(&mut self, data: ChartData) {
        match data {
            ChartData::TotalDevelopers(total) => self.total_developers = Some(total),
            ChartData::TotalRepositories(total) => self.total_repositories = Some(total),
            ChartData::BySeverity(counters) => self.vulnerability_by_severity = Some(counters),
            ChartData::ByAuthor(records) => self.vulnerabilities_by_author = Some(records),
            ChartData::ByRepository(records) => {
                self.vulnerabilities_by_repository = Some(records)
            }
            ChartData::ByLanguage(records) => self.vulnerabilities_by_language = Some(records),
            ChartData::ByTime(records) => self.vulnerabilities_by_time = Some(records),
        }
    }

    fn build(self) -> Result<DashboardCharts, DashboardError> {
        fn require<T>(value: Option<T>, chart: DashboardChart) -> Result<T, DashboardError> {
            value.ok_or_else(|| DashboardError::InternalError {
                message: format!("Chart {} was not produced", chart),
            })
        }

        Ok(DashboardCharts {
            total_developers: require(self.total_developers, DashboardChart::TotalDevelopers)?,
            total_repositories: require(
                self.total_repositories,
                DashboardChart::TotalRepositories,
            )?,
            vulnerability_by_severity: require(
                self.vulnerability_by_severity,
                DashboardChart::VulnerabilitiesBySeverity,
            )?,
            vulnerabilities_by_author: require(
                self.vulnerabilities_by_author,
                DashboardChart::VulnerabilitiesByAuthor,
            )?,
            vulnerabilities_by_repository: require(
                self.vulnerabilities_by_repository,
                DashboardChart::VulnerabilitiesByRepository,
            )?,
            vulnerabilities_by_language: require(
                self.vulnerabilities_by_language,
                DashboardChart::VulnerabilitiesByLanguage,
            )?,
            vulnerabilities_by_time: require(
                self.vulnerabilities_by_time,
                DashboardChart::VulnerabilitiesByTime,
            )?,
        })
    }
}

/// Use case for assembling every dashboard chart under one filter
pub struct GetDashboardChartsUseCase {
    dashboard_repository: Arc<dyn IDashboardRepository>,
    strategy: QueryStrategy,
}

impl GetDashboardChartsUseCase {
    pub fn new(dashboard_repository: Arc<dyn IDashboardRepository>) -> Self {
        Self::with_strategy(dashboard_repository, QueryStrategy::Sequential)
    }

    pub fn with_strategy(
        dashboard_repository: Arc<dyn IDashboardRepository>,
        strategy: QueryStrategy,
    ) -> Self {
        Self {
            dashboard_repository,
            strategy,
        }
    }

    pub fn strategy(&self) -> QueryStrategy {
        self.strategy
    }

    /// Fetch all charts, returning only the first error if any read fails
    #[instrument(skip(self, filter), fields(workspace_id = %filter.workspace_id, strategy = ?self.strategy))]
    pub async fn execute(&self, filter: &DashboardFilter) -> Result<DashboardCharts, DashboardError> {
        let mut builder = ChartsBuilder::default();

        match self.strategy {
            QueryStrategy::Sequential => {
                for chart in CHART_ORDER {
                    builder.apply(self.fetch_chart(chart, filter).await?);
                }
            }
            QueryStrategy::Concurrent => {
                let charts =
                    try_join_all(CHART_ORDER.iter().map(|chart| self.fetch_chart(*chart, filter)))
                        .await?;
                for data in charts {
                    builder.apply(data);
                }
            }
        }

        builder.build()
    }

    /// Run the read behind one chart
    pub async fn fetch_chart(
        &self,
        chart: DashboardChart,
        filter: &DashboardFilter,
    ) -> Result<ChartData, DashboardError> {
        debug!(chart = %chart, "Fetching dashboard chart");
        let repository = &self.dashboard_repository;

        let data = match chart {
            DashboardChart::TotalDevelopers => {
                ChartData::TotalDevelopers(repository.total_developers(filter).await?)
            }
            DashboardChart::TotalRepositories => {
                ChartData::TotalRepositories(repository.total_repositories(filter).await?)
            }
            DashboardChart::VulnerabilitiesBySeverity => {
                ChartData::BySeverity(repository.vulnerabilities_by_severity(filter).await?)
            }
            DashboardChart::VulnerabilitiesByAuthor => {
                ChartData::ByAuthor(repository.vulnerabilities_by_author(filter).await?)
            }
            DashboardChart::VulnerabilitiesByRepository => {
                ChartData::ByRepository(repository.vulnerabilities_by_repository(filter).await?)
            }
            DashboardChart::VulnerabilitiesByLanguage => {
                ChartData::ByLanguage(repository.vulnerabilities_by_language(filter).await?)
            }
            DashboardChart::VulnerabilitiesByTime => {
                ChartData::ByTime(repository.vulnerabilities_by_time(filter).await?)
            }
        };

        Ok(data)
    }
}
