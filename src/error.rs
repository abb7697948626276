//! Error types for the onboarding pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::onboarding::PipelinePhase;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// Every variant is fatal to the stage that produced it.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Onboarding record validation errors, raised before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid start date '{value}': expected YYYY-MM-DD")]
    InvalidStartDate { value: String },
}

/// Why a single stage could not produce its next state.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The gateway call failed. Message is passed through verbatim.
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: PipelinePhase,
        to: PipelinePhase,
    },
}

/// A stage aborted the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: StageError,
    },
}

/// Workflow result store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
