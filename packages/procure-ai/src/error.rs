//! Typed errors for the procurement AI library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the failure kind. Comparison never surfaces an error; its failures are
//! folded into a safe default result.

use std::time::Duration;

use thiserror::Error;

/// Errors from generation calls.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Neither messages nor a prompt were supplied
    #[error("generation request has no messages and no prompt")]
    EmptyRequest,

    /// A sampling parameter is out of range
    #[error("invalid generation request: {reason}")]
    InvalidRequest { reason: String },

    /// Transport or provider-side failure
    #[error("{provider} API call failed: {message}")]
    ProviderCall {
        provider: String,
        message: String,
        /// Whether repeating the call could succeed
        retryable: bool,
    },

    /// Output did not parse or validate against the result schema
    #[error("structured output failed validation: {reason}")]
    SchemaValidation { reason: String },

    /// No registered provider is available
    #[error("no generation provider available{}", requested_suffix(.requested))]
    NoProvider { requested: Option<String> },

    #[error("generation cancelled")]
    Cancelled,

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    pub fn provider_call(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderCall {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderCall { retryable: true, .. })
    }
}

/// Errors from the extraction-agent lifecycle.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Remote service failure other than "not found"
    #[error("extraction service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AgentError {
    pub fn service(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Service(Box::new(err))
    }
}

/// Errors from the document extraction pipeline.
///
/// Remote failures and schema mismatches are separate variants: the first
/// usually calls for a retry, the second for a schema or prompt fix.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported file '{filename}': {reason}")]
    UnsupportedFile { filename: String, reason: String },

    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("could not resolve extraction agent '{agent}': {source}")]
    AgentResolution {
        agent: String,
        #[source]
        source: AgentError,
    },

    #[error("remote extraction failed: {0}")]
    RemoteExtraction(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("extracted payload does not match schema: {reason}")]
    SchemaMismatch { reason: String },

    #[error("extraction cancelled")]
    Cancelled,

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    /// Message safe to show an end user; detail stays in the logs.
    pub fn user_message(&self, label: &str) -> String {
        match self {
            Self::UnsupportedFile { reason, .. } => format!("Unsupported file: {reason}"),
            Self::Cancelled => format!("{label} extraction was cancelled"),
            Self::Timeout(_) => format!("{label} extraction timed out"),
            _ => format!("Failed to extract {label} data from document"),
        }
    }
}

/// Why a comparison fell back to its safe default. Never returned to
/// callers of [`crate::comparison::ComparisonEngine`]; only its text is.
#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("failed to load records: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Missing or malformed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Value could not be made JSON-safe.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("field '{path}' holds a non-finite number")]
    NonFinite { path: String },

    #[error("field '{path}' holds a decimal that cannot be represented as a number")]
    Decimal { path: String },
}

/// Raised when a [`crate::CallContext`] interrupts a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("cancelled")]
    Cancelled,
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<Interrupted> for GenerationError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded(after) => Self::Timeout(after),
        }
    }
}

impl From<Interrupted> for PipelineError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded(after) => Self::Timeout(after),
        }
    }
}

fn requested_suffix(requested: &Option<String>) -> String {
    requested
        .as_deref()
        .map(|name| format!(" (requested '{name}')"))
        .unwrap_or_default()
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Result type alias for agent operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
