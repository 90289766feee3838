//! Assertion helpers over dashboard response bodies

use serde_json::Value;

/// Assertions on a dashboard charts document
pub trait DashboardAssertions {
    /// Assert the headline developer count
    fn assert_total_developers(&self, expected: u64) -> &Self;

    /// Assert the headline repository count
    fn assert_total_repositories(&self, expected: u64) -> &Self;

    /// Assert the number of records in one grouped chart
    fn assert_chart_len(&self, chart: &str, expected: usize) -> &Self;

    /// Assert the open findings of one severity
    fn assert_open_findings(&self, severity: &str, expected: u64) -> &Self;
}

impl DashboardAssertions for Value {
    fn assert_total_developers(&self, expected: u64) -> &Self {
        assert_eq!(
            self["totalDevelopers"].as_u64(),
            Some(expected),
            "unexpected totalDevelopers in {}",
            self
        );
        self
    }

    fn assert_total_repositories(&self, expected: u64) -> &Self {
        assert_eq!(
            self["totalRepositories"].as_u64(),
            Some(expected),
            "unexpected totalRepositories in {}",
            self
        );
        self
    }

    fn assert_chart_len(&self, chart: &str, expected: usize) -> &Self {
        let len = self[chart].as_array().map(Vec::len);
        assert_eq!(len, Some(expected), "unexpected length of {}", chart);
        self
    }

    fn assert_open_findings(&self, severity: &str, expected: u64) -> &Self {
        assert_eq!(
            self["vulnerabilityBySeverity"][severity]["vulnerability"].as_u64(),
            Some(expected),
            "unexpected {} findings",
            severity
        );
        self
    }
}
