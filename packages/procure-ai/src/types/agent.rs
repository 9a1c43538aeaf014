//! Extraction agent specifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use llama_extract_client::{ChunkMode, ExtractConfig, ExtractMode, ExtractTarget};

use crate::types::schema::ResultSchema;

/// Extensions accepted by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc"];

/// MIME types accepted by default.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

/// Everything needed to provision and use one extraction agent.
///
/// The `name` is the agent's identity on the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionAgentSpec {
    pub name: String,
    /// Human label used in user-facing messages ("Quote", "Fuel Bid")
    pub label: String,
    pub schema: Value,
    pub system_prompt: String,
    pub config: ExtractConfig,
    /// Lowercase, dot-prefixed (".pdf")
    pub allowed_extensions: Vec<String>,
    /// Lowercase MIME types
    pub allowed_mime_types: Vec<String>,
}

impl ExtractionAgentSpec {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        schema: Value,
        system_prompt: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            name: name.into(),
            label: label.into(),
            schema,
            config: ExtractConfig::default().with_system_prompt(system_prompt.clone()),
            system_prompt,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config.with_system_prompt(self.system_prompt.clone());
        self
    }

    pub fn with_allowed_types(
        mut self,
        extensions: impl IntoIterator<Item = impl Into<String>>,
        mime_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(&e.into()))
            .collect();
        self.allowed_mime_types = mime_types
            .into_iter()
            .map(|m| m.into().trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// The target schema as a [`ResultSchema`].
    pub fn result_schema(&self) -> ResultSchema {
        ResultSchema::new(self.name.clone(), self.schema.clone())
    }
}

/// Lowercase and dot-prefix an extension (`"PDF"` -> `".pdf"`).
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// An agent as known to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAgent {
    pub id: String,
    pub name: String,
    pub schema: Value,
    pub config: Option<ExtractConfig>,
}

/// Payload plus usage returned by a remote extraction.
#[derive(Debug, Clone, Default)]
pub struct RemoteExtraction {
    pub data: Value,
    pub usage: ExtractionUsage,
}

/// Billing counters for one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionUsage {
    pub pages: u64,
    pub document_tokens: u64,
    pub output_tokens: u64,
}

impl From<llama_extract_client::ExtractUsage> for ExtractionUsage {
    fn from(u: llama_extract_client::ExtractUsage) -> Self {
        Self {
            pages: u.num_pages_extracted,
            document_tokens: u.num_document_tokens,
            output_tokens: u.num_output_tokens,
        }
    }
}
