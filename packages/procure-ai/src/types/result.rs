//! Generation output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token counts. Never null: missing figures are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    /// Usage with `total = input + output`.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
        self.total_tokens += rhs.total_tokens;
    }
}

impl From<openai_client::Usage> for Usage {
    fn from(u: openai_client::Usage) -> Self {
        Self {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
            total_tokens: u64::from(u.total_tokens),
        }
    }
}

/// One generation result, or one element of a generation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Response text; cumulative when streaming
    pub content: String,
    /// Validated JSON, present only when a result schema was supplied
    /// and the content satisfied it
    pub parsed: Option<Value>,
    /// Accurate only on the final element of a stream
    pub usage: Usage,
    /// Model that produced the response
    pub model: String,
    /// Always true for non-streaming calls
    pub is_final: bool,
}

/// A schema-constrained result deserialized into `T`.
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    pub result: GenerationResult,
}

/// Raw provider reply to a completion call.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub content: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// One delta from a provider stream.
#[derive(Debug, Clone, Default)]
pub struct ProviderChunk {
    pub delta: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

impl ProviderChunk {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: text.into(),
            ..Default::default()
        }
    }
}
