//! Dashboard value objects

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::analysis::{RepositoryId, WorkspaceId};

use super::errors::DashboardError;

/// Width of the buckets used by the by-time facet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucketGranularity {
    /// Midnight UTC of the same day
    #[default]
    Day,
    /// Midnight UTC of the first day of the month
    Month,
}

impl TimeBucketGranularity {
    /// Truncate a timestamp to the start of its bucket
    pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let date = timestamp.date_naive();
        let start = match self {
            TimeBucketGranularity::Day => date,
            TimeBucketGranularity::Month => date.with_day(1).unwrap_or(date),
        };
        Utc.from_utc_datetime(&start.and_time(chrono::NaiveTime::MIN))
    }
}

/// Grouping dimension of a rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Author,
    Language,
    Repository,
    Time,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::Author,
        Facet::Language,
        Facet::Repository,
        Facet::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Author => "author",
            Facet::Language => "language",
            Facet::Repository => "repository",
            Facet::Time => "time",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named read step of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardChart {
    TotalDevelopers,
    TotalRepositories,
    VulnerabilitiesBySeverity,
    VulnerabilitiesByAuthor,
    VulnerabilitiesByRepository,
    VulnerabilitiesByLanguage,
    VulnerabilitiesByTime,
}

/// Order in which the dashboard charts are fetched
pub const CHART_ORDER: [DashboardChart; 7] = [
    DashboardChart::TotalDevelopers,
    DashboardChart::TotalRepositories,
    DashboardChart::VulnerabilitiesBySeverity,
    DashboardChart::VulnerabilitiesByAuthor,
    DashboardChart::VulnerabilitiesByRepository,
    DashboardChart::VulnerabilitiesByLanguage,
    DashboardChart::VulnerabilitiesByTime,
];

impl DashboardChart {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardChart::TotalDevelopers => "total_developers",
            DashboardChart::TotalRepositories => "total_repositories",
            DashboardChart::VulnerabilitiesBySeverity => "vulnerabilities_by_severity",
            DashboardChart::VulnerabilitiesByAuthor => "vulnerabilities_by_author",
            DashboardChart::VulnerabilitiesByRepository => "vulnerabilities_by_repository",
            DashboardChart::VulnerabilitiesByLanguage => "vulnerabilities_by_language",
            DashboardChart::VulnerabilitiesByTime => "vulnerabilities_by_time",
        }
    }
}

impl fmt::Display for DashboardChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date window, compared at day resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    initial: DateTime<Utc>,
    final_date: DateTime<Utc>,
}

impl DateRange {
    pub fn new(initial: DateTime<Utc>, final_date: DateTime<Utc>) -> Result<Self, DashboardError> {
        if initial > final_date {
            return Err(DashboardError::invalid_filter(format!(
                "initialDate ({}) must not be after finalDate ({})",
                initial.to_rfc3339(),
                final_date.to_rfc3339()
            )));
        }

        Ok(Self {
            initial,
            final_date,
        })
    }

    pub fn initial(&self) -> DateTime<Utc> {
        self.initial
    }

    pub fn final_date(&self) -> DateTime<Utc> {
        self.final_date
    }

    pub fn initial_day(&self) -> NaiveDate {
        self.initial.date_naive()
    }

    pub fn final_day(&self) -> NaiveDate {
        self.final_date.date_naive()
    }

    /// Whether a rollup partition for `day` falls inside the window
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.initial_day() <= day && day <= self.final_day()
    }
}

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page: u32,
    size: u32,
}

impl Pagination {
    pub fn new(page: u32, size: u32, max_size: u32) -> Result<Self, DashboardError> {
        if page == 0 {
            return Err(DashboardError::invalid_filter("page must be a positive integer"));
        }
        if size == 0 {
            return Err(DashboardError::invalid_filter("size must be a positive integer"));
        }
        if size > max_size {
            return Err(DashboardError::invalid_filter(format!(
                "size must not exceed {}",
                max_size
            )));
        }

        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    /// Slice an already ordered collection down to this page
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.size as usize)
            .collect()
    }
}

/// Raw query parameters as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub initial_date: Option<String>,
    pub final_date: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Validated scope of a dashboard query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFilter {
    pub workspace_id: WorkspaceId,
    pub repository_id: Option<RepositoryId>,
    pub date_range: Option<DateRange>,
    pub pagination: Option<Pagination>,
}

impl DashboardFilter {
    /// Whole-workspace filter without dates or paging
    pub fn for_workspace(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            repository_id: None,
            date_range: None,
            pagination: None,
        }
    }

    pub fn with_repository(mut self, repository_id: RepositoryId) -> Self {
        self.repository_id = Some(repository_id);
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Build a filter from raw query parameters.
    ///
    /// Dates must be RFC 3339 and either both present or both absent. A
    /// `size` without `page` selects the first page; a `page` without `size`
    /// is rejected.
    pub fn parse(
        workspace_id: WorkspaceId,
        repository_id: Option<RepositoryId>,
        params: &FilterParams,
        max_page_size: u32,
    ) -> Result<Self, DashboardError> {
        let initial = parse_timestamp("initialDate", params.initial_date.as_deref())?;
        let final_date = parse_timestamp("finalDate", params.final_date.as_deref())?;

        let date_range = match (initial, final_date) {
            (Some(initial), Some(final_date)) => Some(DateRange::new(initial, final_date)?),
            (None, None) => None,
            _ => {
                return Err(DashboardError::invalid_filter(
                    "initialDate and finalDate must be provided together",
                ));
            }
        };

        let page = parse_positive("page", params.page.as_deref())?;
        let size = parse_positive("size", params.size.as_deref())?;

        let pagination = match (page, size) {
            (Some(page), Some(size)) => Some(Pagination::new(page, size, max_page_size)?),
            (None, Some(size)) => Some(Pagination::new(1, size, max_page_size)?),
            (Some(_), None) => {
                return Err(DashboardError::invalid_filter(
                    "size is required when page is provided",
                ));
            }
            (None, None) => None,
        };

        Ok(Self {
            workspace_id,
            repository_id,
            date_range,
            pagination,
        })
    }

    /// Whether a stored partition belongs to this filter's scope
    pub fn matches(
        &self,
        workspace_id: &WorkspaceId,
        repository_id: &RepositoryId,
        day: NaiveDate,
    ) -> bool {
        if self.workspace_id != *workspace_id {
            return false;
        }
        if let Some(expected) = &self.repository_id {
            if expected != repository_id {
                return false;
            }
        }
        self.date_range
            .map(|range| range.contains_day(day))
            .unwrap_or(true)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timestamp(
    name: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DashboardError> {
    non_blank(value)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|e| {
                    DashboardError::invalid_filter(format!(
                        "{} is not a valid RFC 3339 timestamp: {}",
                        name, e
                    ))
                })
        })
        .transpose()
}

fn parse_positive(name: &str, value: Option<&str>) -> Result<Option<u32>, DashboardError> {
    non_blank(value)
        .map(|raw| {
            raw.parse::<u32>()
                .ok()
                .filter(|parsed| *parsed > 0)
                .ok_or_else(|| {
                    DashboardError::invalid_filter(format!("{} must be a positive integer", name))
                })
        })
        .transpose()
}
