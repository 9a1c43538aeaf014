use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlamaExtractError>;

#[derive(Debug, Error)]
pub enum LlamaExtractError {
    /// Missing or invalid client settings
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LlamaCloud API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("extraction job {job_id} ended with status {status}: {message}")]
    JobFailed {
        job_id: String,
        status: String,
        message: String,
    },

    #[error("extraction job {job_id} did not finish within {waited_secs}s")]
    Timeout { job_id: String, waited_secs: u64 },

    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

impl LlamaExtractError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
