//! Analysis entities
//!
//! Field names on the wire follow the analysis platform's camelCase JSON
//! (`repositoryID`, `analysisVulnerabilities`, `commitEmail`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lenient;
use super::value_objects::{
    AnalysisId, AnalysisStatus, Confidence, RepositoryId, Severity, VulnerabilityType,
    WorkspaceId,
};

/// One completed scan of a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "id")]
    pub id: AnalysisId,
    #[serde(rename = "repositoryID")]
    pub repository_id: RepositoryId,
    pub repository_name: String,
    #[serde(rename = "workspaceID")]
    pub workspace_id: WorkspaceId,
    pub workspace_name: String,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub errors: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::skip_invalid")]
    pub analysis_vulnerabilities: Vec<AnalysisVulnerability>,
}

impl AnalysisResult {
    /// Iterate the findings in scan order
    pub fn vulnerabilities(&self) -> impl Iterator<Item = &Vulnerability> {
        self.analysis_vulnerabilities
            .iter()
            .map(|analysis_vuln| &analysis_vuln.vulnerability)
    }

    pub fn vulnerability_count(&self) -> usize {
        self.analysis_vulnerabilities.len()
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }
}

/// Link between an analysis and one of its findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisVulnerability {
    #[serde(
        rename = "vulnerabilityID",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub vulnerability_id: Uuid,
    #[serde(rename = "analysisID", default, deserialize_with = "lenient::or_default")]
    pub analysis_id: AnalysisId,
    #[serde(default = "Utc::now", deserialize_with = "lenient::timestamp_or_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub vulnerability: Vulnerability,
}

/// A single finding reported by a security tool
///
/// Every field is optional on the wire and a mistyped field decodes to its
/// default, so a partially populated finding still aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vulnerability {
    #[serde(rename = "vulnerabilityID", deserialize_with = "lenient::or_default")]
    pub vulnerability_id: Uuid,
    #[serde(deserialize_with = "lenient::string")]
    pub line: String,
    #[serde(deserialize_with = "lenient::string")]
    pub column: String,
    pub confidence: Confidence,
    #[serde(deserialize_with = "lenient::string")]
    pub file: String,
    #[serde(deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(deserialize_with = "lenient::string")]
    pub details: String,
    #[serde(deserialize_with = "lenient::string")]
    pub security_tool: String,
    #[serde(deserialize_with = "lenient::string")]
    pub language: String,
    pub severity: Severity,
    #[serde(deserialize_with = "lenient::string")]
    pub vuln_hash: String,
    #[serde(rename = "type")]
    pub vuln_type: VulnerabilityType,
    #[serde(flatten)]
    pub commit: CommitProvenance,
}

/// Commit that introduced a finding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitProvenance {
    #[serde(deserialize_with = "lenient::string")]
    pub commit_author: String,
    #[serde(deserialize_with = "lenient::string")]
    pub commit_email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub commit_hash: String,
    #[serde(deserialize_with = "lenient::string")]
    pub commit_message: String,
    #[serde(deserialize_with = "lenient::string")]
    pub commit_date: String,
}

impl CommitProvenance {
    /// Author identity used for grouping: the email, else the author name
    pub fn author_identity(&self) -> Option<&str> {
        [self.commit_email.trim(), self.commit_author.trim()]
            .into_iter()
            .find(|value| !value.is_empty())
    }
}
