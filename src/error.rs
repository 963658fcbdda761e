//! Error types for Revisor
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Revisor
#[derive(Debug, Error)]
pub enum RevisorError {
    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Revisor operations
pub type Result<T> = std::result::Result<T, RevisorError>;
