//! Dashboard domain errors

use thiserror::Error;

/// Dashboard domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Query parameters failed validation
    #[error("Invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// Analysis cannot be ingested in its current state
    #[error("Invalid analysis: {reason}")]
    InvalidAnalysis { reason: String },

    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl DashboardError {
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }

    pub fn invalid_analysis(reason: impl Into<String>) -> Self {
        Self::InvalidAnalysis {
            reason: reason.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
        }
    }

    /// Check if the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DashboardError::InvalidFilter { .. } | DashboardError::InvalidAnalysis { .. }
        )
    }
}
