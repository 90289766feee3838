//! Test data fixtures for vulnera-analytic-core

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use vulnera_analytic_core::domain::analysis::{
    AnalysisId, AnalysisResult, AnalysisStatus, AnalysisVulnerability, CommitProvenance,
    Confidence, RepositoryId, Severity, Vulnerability, VulnerabilityType, WorkspaceId,
};

pub const HORUSEC_EMAIL: &str = "horusec@zup.com.br";

/// Fixed analysis timestamp shared by the fixtures
pub fn analysis_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 31, 10, 58, 42).unwrap()
}

/// A single finding with the given author email, language and severity
pub fn finding(email: &str, language: &str, severity: Severity) -> AnalysisVulnerability {
    let vulnerability_id = Uuid::new_v4();
    AnalysisVulnerability {
        vulnerability_id,
        analysis_id: AnalysisId::default(),
        created_at: analysis_time(),
        vulnerability: Vulnerability {
            vulnerability_id,
            line: "1".to_string(),
            column: "1".to_string(),
            confidence: Confidence::High,
            file: "/deployments/cert.pem".to_string(),
            code: "-----BEGIN CERTIFICATE-----".to_string(),
            details: "Asymmetric Private Key".to_string(),
            security_tool: "HorusecEngine".to_string(),
            language: language.to_string(),
            severity,
            vuln_hash: Uuid::new_v4().to_string(),
            vuln_type: VulnerabilityType::Vulnerability,
            commit: CommitProvenance {
                commit_author: "Horusec".to_string(),
                commit_email: email.to_string(),
                commit_hash: "a1b2c3".to_string(),
                commit_message: "Initial Commit".to_string(),
                commit_date: "2021-03-31T10:58:42Z".to_string(),
            },
        },
    }
}

/// A finished analysis in a fresh workspace and repository
pub fn analysis_with(findings: Vec<AnalysisVulnerability>) -> AnalysisResult {
    analysis_in(WorkspaceId::generate(), RepositoryId::generate(), "my-repository", findings)
}

pub fn analysis_in(
    workspace_id: WorkspaceId,
    repository_id: RepositoryId,
    repository_name: &str,
    findings: Vec<AnalysisVulnerability>,
) -> AnalysisResult {
    let id = AnalysisId::generate();
    AnalysisResult {
        id,
        repository_id,
        repository_name: repository_name.to_string(),
        workspace_id,
        workspace_name: "my-workspace".to_string(),
        status: AnalysisStatus::Success,
        errors: String::new(),
        created_at: analysis_time(),
        finished_at: Some(analysis_time()),
        analysis_vulnerabilities: findings
            .into_iter()
            .map(|mut finding| {
                finding.analysis_id = id;
                finding
            })
            .collect(),
    }
}

/// Two critical leaks committed by the same author
pub fn analysis_mock() -> AnalysisResult {
    analysis_with(vec![
        finding(HORUSEC_EMAIL, "Leaks", Severity::Critical),
        finding(HORUSEC_EMAIL, "Leaks", Severity::Critical),
    ])
}
