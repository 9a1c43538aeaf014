//! Pure OpenAI REST API client
//!
//! A clean, minimal client for the Chat Completions API with no domain-specific
//! logic. Supports plain and streaming completions, JSON and JSON-schema
//! constrained output, and tool definitions.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-5-nano").message(Message::user("Hello!")),
//! ).await?;
//! ```
//!
//! # Type-Safe Structured Output
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct Vendor {
//!     name: Option<String>,
//!     email: Option<String>,
//! }
//!
//! let vendor: Vendor = client
//!     .extract::<Vendor>("gpt-5-nano", system_prompt, document_text)
//!     .await?;
//! ```

pub mod error;
pub mod schema;
pub mod streaming;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::{strict_schema, StructuredOutput};
pub use streaming::{ChatCompletionChunk, ChatCompletionStream};
pub use types::*;

use std::time::Duration;

use reqwest::{header, Client, Response};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from `OPENAI_API_KEY`, honouring `OPENAI_BASE_URL` when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    /// Set a custom base URL (Azure, proxies, OpenAI-compatible servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Apply a whole-request timeout to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Type-safe structured output extraction.
    ///
    /// Generates a strict JSON schema from `T`, sends it as the
    /// `json_schema` response format, and deserializes the reply.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = ChatRequest::new(model)
            .message(Message::system(system_prompt))
            .message(Message::user(user_prompt))
            .response_format(ResponseFormat::json_schema(T::type_name(), T::openai_schema()));

        let response = self.chat_completion(request).await?;

        serde_json::from_str(strip_code_blocks(&response.content)).map_err(|e| {
            OpenAIError::Parse(format!("Failed to deserialize response: {}", e))
        })
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self.post_chat(&request).await?;

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let choice = raw.choices.into_iter().next().ok_or_else(|| OpenAIError::Api {
            status: 200,
            message: "No choices in OpenAI response".into(),
        })?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: if raw.model.is_empty() { request.model } else { raw.model },
            finish_reason: choice.finish_reason,
            usage: raw.usage,
        })
    }

    /// Streaming chat completion.
    ///
    /// Forces `stream: true` and asks for the usage trailer chunk.
    pub async fn chat_completion_stream(
        &self,
        mut request: ChatRequest,
    ) -> Result<ChatCompletionStream> {
        request.stream = Some(true);
        request.stream_options = Some(StreamOptions { include_usage: true });

        let response = self.post_chat(&request).await?;
        Ok(ChatCompletionStream::new(response.bytes_stream()))
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}
