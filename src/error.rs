//! Error types for the business plan pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {

    // =============================
    // Input & Data Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Research error: {0}")]
    ResearchError(String),

    // =============================
    // Stage Errors
    // =============================

    #[error("Stage '{stage}' timed out after {}s", .after.as_secs_f64())]
    Timeout { stage: String, after: Duration },

    #[error("Enrichment error: {0}")]
    EnrichmentError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl PipelineError {
    pub fn timeout(stage: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            stage: stage.into(),
            after,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
