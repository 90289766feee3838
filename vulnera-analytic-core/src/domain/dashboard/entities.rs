//! Dashboard domain entities
//!
//! Rollup records are pre-aggregated counters keyed by one facet. They are
//! produced per analysis and merged additively by the rollup store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::domain::analysis::{RepositoryId, Severity, VulnerabilityType, WorkspaceId};

use super::value_objects::Facet;

/// Counts for one severity, split by triage state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounters {
    pub vulnerability: u64,
    pub risk_accepted: u64,
    pub false_positive: u64,
    pub corrected: u64,
}

impl TypeCounters {
    pub fn get(&self, vuln_type: VulnerabilityType) -> u64 {
        match vuln_type {
            VulnerabilityType::Vulnerability => self.vulnerability,
            VulnerabilityType::RiskAccepted => self.risk_accepted,
            VulnerabilityType::FalsePositive => self.false_positive,
            VulnerabilityType::Corrected => self.corrected,
        }
    }

    pub fn get_mut(&mut self, vuln_type: VulnerabilityType) -> &mut u64 {
        match vuln_type {
            VulnerabilityType::Vulnerability => &mut self.vulnerability,
            VulnerabilityType::RiskAccepted => &mut self.risk_accepted,
            VulnerabilityType::FalsePositive => &mut self.false_positive,
            VulnerabilityType::Corrected => &mut self.corrected,
        }
    }

    pub fn total(&self) -> u64 {
        self.vulnerability + self.risk_accepted + self.false_positive + self.corrected
    }

    pub fn merge(&mut self, other: &TypeCounters) {
        self.vulnerability += other.vulnerability;
        self.risk_accepted += other.risk_accepted;
        self.false_positive += other.false_positive;
        self.corrected += other.corrected;
    }
}

/// Severity counters embedded in every rollup record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityCounters {
    #[serde(rename = "workspaceID")]
    pub workspace_id: WorkspaceId,
    /// `None` when the counters span a whole workspace
    #[serde(rename = "repositoryID")]
    pub repository_id: Option<RepositoryId>,
    pub active: bool,
    pub critical: TypeCounters,
    pub high: TypeCounters,
    pub medium: TypeCounters,
    pub low: TypeCounters,
    pub info: TypeCounters,
    pub unknown: TypeCounters,
}

impl VulnerabilityCounters {
    /// Empty, active counters for a scope
    pub fn new(workspace_id: WorkspaceId, repository_id: Option<RepositoryId>) -> Self {
        Self {
            workspace_id,
            repository_id,
            active: true,
            critical: TypeCounters::default(),
            high: TypeCounters::default(),
            medium: TypeCounters::default(),
            low: TypeCounters::default(),
            info: TypeCounters::default(),
            unknown: TypeCounters::default(),
        }
    }

    pub fn for_severity(&self, severity: Severity) -> &TypeCounters {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
            Severity::Low => &self.low,
            Severity::Info => &self.info,
            Severity::Unknown => &self.unknown,
        }
    }

    pub fn for_severity_mut(&mut self, severity: Severity) -> &mut TypeCounters {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
            Severity::Unknown => &mut self.unknown,
        }
    }

    /// Count one finding
    pub fn record(&mut self, severity: Severity, vuln_type: VulnerabilityType) {
        *self.for_severity_mut(severity).get_mut(vuln_type) += 1;
    }

    pub fn get(&self, severity: Severity, vuln_type: VulnerabilityType) -> u64 {
        self.for_severity(severity).get(vuln_type)
    }

    /// Number of findings across every severity and type
    pub fn total(&self) -> u64 {
        Severity::ALL
            .iter()
            .map(|severity| self.for_severity(*severity).total())
            .sum()
    }

    /// Add another record's counts into this one
    pub fn merge(&mut self, other: &VulnerabilityCounters) {
        for severity in Severity::ALL {
            self.for_severity_mut(severity)
                .merge(other.for_severity(severity));
        }
        self.active |= other.active;
    }
}

/// Common shape of the four facet rollups
pub trait RollupRecord: Clone + Send + Sync + 'static {
    /// Identity of a row when reads merge partitions together
    type Group: Clone + Eq + Hash + Ord + Send + Sync;

    const FACET: Facet;

    fn group(&self) -> Self::Group;

    fn vulnerability(&self) -> &VulnerabilityCounters;

    fn vulnerability_mut(&mut self) -> &mut VulnerabilityCounters;

    fn created_at(&self) -> DateTime<Utc>;

    fn set_created_at(&mut self, created_at: DateTime<Utc>);

    /// Fold another record of the same group into this one
    fn absorb(&mut self, other: &Self) {
        self.vulnerability_mut().merge(other.vulnerability());
        if other.created_at() > self.created_at() {
            self.set_created_at(other.created_at());
        }
    }
}

macro_rules! rollup_record {
    ($name:ident, $facet:expr, $group:ty, |$record:ident| $group_expr:expr) => {
        impl RollupRecord for $name {
            type Group = $group;

            const FACET: Facet = $facet;

            fn group(&self) -> Self::Group {
                let $record = self;
                $group_expr
            }

            fn vulnerability(&self) -> &VulnerabilityCounters {
                &self.vulnerability
            }

            fn vulnerability_mut(&mut self) -> &mut VulnerabilityCounters {
                &mut self.vulnerability
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn set_created_at(&mut self, created_at: DateTime<Utc>) {
                self.created_at = created_at;
            }
        }
    };
}

/// Findings grouped by commit author email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitiesByAuthor {
    pub author: String,
    pub vulnerability: VulnerabilityCounters,
    pub created_at: DateTime<Utc>,
}

/// Findings grouped by language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitiesByLanguage {
    pub language: String,
    pub vulnerability: VulnerabilityCounters,
    pub created_at: DateTime<Utc>,
}

/// Findings grouped by repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitiesByRepository {
    pub repository_name: String,
    pub vulnerability: VulnerabilityCounters,
    pub created_at: DateTime<Utc>,
}

/// Findings grouped by time bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitiesByTime {
    /// Start of the bucket
    pub time: DateTime<Utc>,
    pub vulnerability: VulnerabilityCounters,
    pub created_at: DateTime<Utc>,
}

rollup_record!(VulnerabilitiesByAuthor, Facet::Author, String, |r| r.author.clone());
rollup_record!(VulnerabilitiesByLanguage, Facet::Language, String, |r| r.language.clone());
rollup_record!(
    VulnerabilitiesByRepository,
    Facet::Repository,
    (String, Option<RepositoryId>),
    |r| (r.repository_name.clone(), r.vulnerability.repository_id)
);
rollup_record!(VulnerabilitiesByTime, Facet::Time, DateTime<Utc>, |r| r.time);

/// Composed dashboard document. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub total_developers: u64,
    pub total_repositories: u64,
    pub vulnerability_by_severity: VulnerabilityCounters,
    pub vulnerabilities_by_author: Vec<VulnerabilitiesByAuthor>,
    pub vulnerabilities_by_repository: Vec<VulnerabilitiesByRepository>,
    pub vulnerabilities_by_language: Vec<VulnerabilitiesByLanguage>,
    pub vulnerabilities_by_time: Vec<VulnerabilitiesByTime>,
}
