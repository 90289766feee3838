//! Configuration validation module

use crate::config::{
    Config, DashboardConfig, DatabaseConfig, IngestionConfig, LoggingConfig, ServerConfig,
    StorageBackend,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Database configuration error: {message}")]
    Database { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },

    #[error("Dashboard configuration error: {message}")]
    Dashboard { message: String },

    #[error("Ingestion configuration error: {message}")]
    Ingestion { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    pub fn dashboard(message: impl Into<String>) -> Self {
        Self::Dashboard {
            message: message.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::Memory {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err(ValidationError::database("Database URL cannot be empty"));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::database(
                "Database URL must start with postgres:// or postgresql://",
            ));
        }

        if self.max_connections == 0 {
            return Err(ValidationError::database(
                "Max connections must be greater than 0",
            ));
        }

        if let Some(min_idle) = self.min_idle {
            if min_idle > self.max_connections {
                return Err(ValidationError::database(format!(
                    "Minimum idle connections ({}) cannot exceed max connections ({})",
                    min_idle, self.max_connections
                )));
            }
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "json" | "pretty" | "text" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Unsupported log format '{}', expected json, pretty or text",
                other
            ))),
        }
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_page_size == 0 {
            return Err(ValidationError::dashboard(
                "Max page size must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for IngestionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::ingestion(
                "Queue capacity must be greater than 0",
            ));
        }

        if self.max_concurrent_ingestions == 0 {
            return Err(ValidationError::ingestion(
                "Max concurrent ingestions must be greater than 0",
            ));
        }

        if self.queue_capacity > IngestionConfig::MAX_QUEUE_CAPACITY {
            return Err(ValidationError::ingestion(format!(
                "Queue capacity must be at most {}",
                IngestionConfig::MAX_QUEUE_CAPACITY
            )));
        }

        if self.max_concurrent_ingestions > IngestionConfig::MAX_CONCURRENT_INGESTIONS {
            return Err(ValidationError::ingestion(format!(
                "Max concurrent ingestions must be at most {}",
                IngestionConfig::MAX_CONCURRENT_INGESTIONS
            )));
        }

        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.dashboard.validate()?;
        self.ingestion.validate()?;
        Ok(())
    }
}
