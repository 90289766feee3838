//! Analysis value objects

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::lenient;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Workspace (tenant) identifier
    WorkspaceId
);
uuid_id!(
    /// Repository identifier
    RepositoryId
);
uuid_id!(
    /// Analysis (scan) identifier
    AnalysisId
);

/// Vulnerability severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Missing or unrecognised severity
    #[default]
    Unknown,
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 6] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
        Severity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            "INFO" => Ok(Severity::Info),
            "UNKNOWN" => Ok(Severity::Unknown),
            other => Err(format!("Invalid severity: {}", other)),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::parsed(deserializer)
    }
}

/// Triage state of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VulnerabilityType {
    /// Open finding
    #[default]
    Vulnerability,
    RiskAccepted,
    FalsePositive,
    Corrected,
}

impl VulnerabilityType {
    pub const ALL: [VulnerabilityType; 4] = [
        VulnerabilityType::Vulnerability,
        VulnerabilityType::RiskAccepted,
        VulnerabilityType::FalsePositive,
        VulnerabilityType::Corrected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnerabilityType::Vulnerability => "Vulnerability",
            VulnerabilityType::RiskAccepted => "Risk Accepted",
            VulnerabilityType::FalsePositive => "False Positive",
            VulnerabilityType::Corrected => "Corrected",
        }
    }
}

impl fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VulnerabilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "vulnerability" => Ok(VulnerabilityType::Vulnerability),
            "riskaccepted" => Ok(VulnerabilityType::RiskAccepted),
            "falsepositive" => Ok(VulnerabilityType::FalsePositive),
            "corrected" => Ok(VulnerabilityType::Corrected),
            _ => Err(format!("Invalid vulnerability type: {}", s)),
        }
    }
}

impl Serialize for VulnerabilityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VulnerabilityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::parsed(deserializer)
    }
}

/// Confidence the detecting tool reports for a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
            Confidence::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Confidence::High),
            "MEDIUM" => Ok(Confidence::Medium),
            "LOW" => Ok(Confidence::Low),
            "UNKNOWN" => Ok(Confidence::Unknown),
            other => Err(format!("Invalid confidence: {}", other)),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::parsed(deserializer)
    }
}

/// Lifecycle state of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Running,
    Success,
    Error,
}

impl AnalysisStatus {
    /// Whether the scan has stopped producing findings
    pub fn is_finished(&self) -> bool {
        matches!(self, AnalysisStatus::Success | AnalysisStatus::Error)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Running => write!(f, "running"),
            AnalysisStatus::Success => write!(f, "success"),
            AnalysisStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert!(Severity::Info > Severity::Unknown);
    }

    #[test]
    fn test_severity_lenient_deserialization() {
        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);

        let unknown: Severity = serde_json::from_str("\"SEVERE\"").unwrap();
        assert_eq!(unknown, Severity::Unknown);

        let null: Severity = serde_json::from_str("null").unwrap();
        assert_eq!(null, Severity::Unknown);

        let numeric: Severity = serde_json::from_str("3").unwrap();
        assert_eq!(numeric, Severity::Unknown);
    }

    #[test]
    fn test_vulnerability_type_accepts_wire_spellings() {
        assert_eq!(
            "Risk Accepted".parse::<VulnerabilityType>().unwrap(),
            VulnerabilityType::RiskAccepted
        );
        assert_eq!(
            "false_positive".parse::<VulnerabilityType>().unwrap(),
            VulnerabilityType::FalsePositive
        );
        assert!("Fixed".parse::<VulnerabilityType>().is_err());
    }

    #[test]
    fn test_vulnerability_type_serializes_display_name() {
        let json = serde_json::to_string(&VulnerabilityType::FalsePositive).unwrap();
        assert_eq!(json, "\"False Positive\"");
    }

    #[test]
    fn test_analysis_status_finished() {
        assert!(!AnalysisStatus::Running.is_finished());
        assert!(AnalysisStatus::Success.is_finished());
        assert!(AnalysisStatus::Error.is_finished());
    }

    #[test]
    fn test_ids_are_transparent_uuids() {
        let uuid = Uuid::new_v4();
        let id = WorkspaceId::from(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
