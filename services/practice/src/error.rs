//! services/practice/src/error.rs
//!
//! Defines the primary error type for the practice service.

use crate::config::ConfigError;
use dental_core::ports::PortError;

/// The primary error type for the `practice` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a failure to encode or decode stored JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., writing a backup file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The runner was invoked with an unknown command.
    #[error("Usage error: {0}")]
    Usage(String),
}
