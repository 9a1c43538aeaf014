use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much effort the service spends per document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractMode {
    Fast,
    #[default]
    Balanced,
    Premium,
    Multimodal,
}

/// Whether one record is produced per document or per page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractTarget {
    #[default]
    PerDoc,
    PerPage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkMode {
    #[default]
    Page,
    Section,
}

/// Agent-level extraction settings.
///
/// Defaults favour recall: high-resolution parsing on, cache kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub extraction_mode: ExtractMode,
    #[serde(default)]
    pub extraction_target: ExtractTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub chunk_mode: ChunkMode,
    #[serde(default = "default_true")]
    pub high_resolution_mode: bool,
    #[serde(default)]
    pub invalidate_cache: bool,
    #[serde(default)]
    pub use_reasoning: bool,
    #[serde(default)]
    pub cite_sources: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extraction_mode: ExtractMode::Balanced,
            extraction_target: ExtractTarget::PerDoc,
            system_prompt: None,
            chunk_mode: ChunkMode::Page,
            high_resolution_mode: true,
            invalidate_cache: false,
            use_reasoning: false,
            cite_sources: false,
        }
    }
}

impl ExtractConfig {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// A named extraction agent as stored by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionAgent {
    pub id: String,
    pub name: String,
    pub data_schema: Value,
    #[serde(default)]
    pub config: Option<ExtractConfig>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAgentRequest<'a> {
    pub name: &'a str,
    pub data_schema: &'a Value,
    pub config: &'a ExtractConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateAgentRequest<'a> {
    pub data_schema: &'a Value,
    pub config: &'a ExtractConfig,
}

/// An uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateJobRequest<'a> {
    pub extraction_agent_id: &'a str,
    pub file_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Success,
    PartialSuccess,
    Error,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Unknown)
    }
}

/// Extraction job metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a finished extraction job.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRun {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub extraction_metadata: Value,
}

/// Billing counters reported under `extraction_metadata.usage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractUsage {
    #[serde(default)]
    pub num_pages_extracted: u64,
    #[serde(default)]
    pub num_document_tokens: u64,
    #[serde(default)]
    pub num_output_tokens: u64,
}

impl ExtractRun {
    /// Usage counters, zero when the service omitted them.
    pub fn usage(&self) -> ExtractUsage {
        self.extraction_metadata
            .get("usage")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults_on_the_wire() {
        let value = serde_json::to_value(ExtractConfig::default()).unwrap();

        assert_eq!(value["extraction_mode"], "BALANCED");
        assert_eq!(value["extraction_target"], "PER_DOC");
        assert_eq!(value["chunk_mode"], "PAGE");
        assert_eq!(value["high_resolution_mode"], true);
        assert_eq!(value["invalidate_cache"], false);
        assert!(value.get("system_prompt").is_none());
    }

    #[test]
    fn test_unknown_job_status_is_not_terminal() {
        let job: ExtractJob =
            serde_json::from_value(json!({"id": "j1", "status": "QUEUED_SOMEWHERE"})).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn test_usage_from_metadata() {
        let run: ExtractRun = serde_json::from_value(json!({
            "data": {"quotes": []},
            "extraction_metadata": {"usage": {"num_pages_extracted": 2, "num_output_tokens": 90}}
        }))
        .unwrap();

        let usage = run.usage();
        assert_eq!(usage.num_pages_extracted, 2);
        assert_eq!(usage.num_document_tokens, 0);
        assert_eq!(usage.num_output_tokens, 90);
    }
}
