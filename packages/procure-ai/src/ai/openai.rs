//! OpenAI chat completions as a [`GenerationProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use procure_ai::ai::OpenAiProvider;
//! use procure_ai::generation::GenerationAdapter;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let adapter = GenerationAdapter::new(Arc::new(provider));
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use openai_client::{ChatRequest, OpenAIClient, OpenAIError, ResponseFormat};

use crate::error::{GenerationError, Result};
use crate::traits::{ChunkStream, GenerationProvider};
use crate::types::{Message, ProviderChunk, ProviderRequest, ProviderResponse, Role};

const PROVIDER: &str = "openai";

/// OpenAI-backed provider.
///
/// Structured requests are sent as strict `json_schema` response formats.
/// With `strict` off they fall back to `json_object` and rely on the
/// adapter's validation alone.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: OpenAIClient,
    strict: bool,
}

impl OpenAiProvider {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            strict: true,
        }
    }

    /// Create from `OPENAI_API_KEY` (and optional `OPENAI_BASE_URL`).
    pub fn from_env() -> Result<Self> {
        let client = OpenAIClient::from_env().map_err(map_error)?;
        Ok(Self::new(client))
    }

    pub fn with_strict_schemas(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn client(&self) -> &OpenAIClient {
        &self.client
    }

    fn chat_request(&self, request: &ProviderRequest) -> ChatRequest {
        let mut chat = ChatRequest::new(&request.model);
        for message in &request.messages {
            chat = chat.message(wire_message(message));
        }
        if let Some(t) = request.temperature {
            chat = chat.temperature(t);
        }
        if let Some(p) = request.top_p {
            chat = chat.top_p(p);
        }
        if let Some(n) = request.max_output_tokens {
            chat = chat.output_limit(n);
        }
        if let Some(stop) = &request.stop {
            chat = chat.stop(stop.clone());
        }
        if let Some(tools) = &request.tools {
            chat = chat.tools(tools.clone(), request.tool_choice.clone());
        }
        if let Some(schema) = &request.schema {
            let format = if self.strict {
                ResponseFormat::json_schema(
                    schema_name(&schema.name),
                    openai_client::strict_schema(schema.schema.clone()),
                )
            } else {
                ResponseFormat::JsonObject
            };
            chat = chat.response_format(format);
        }
        chat
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let response = self
            .client
            .chat_completion(self.chat_request(request))
            .await
            .map_err(map_error)?;

        Ok(ProviderResponse {
            content: response.content,
            model: Some(response.model),
            usage: response.usage.map(Into::into),
        })
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<ChunkStream> {
        let stream = self
            .client
            .chat_completion_stream(self.chat_request(request))
            .await
            .map_err(map_error)?;

        Ok(stream
            .map(|chunk| {
                chunk.map_err(map_error).map(|c| ProviderChunk {
                    delta: c.delta,
                    model: c.model,
                    usage: c.usage.map(Into::into),
                })
            })
            .boxed())
    }

    async fn health_check(&self) -> bool {
        !self.client.api_key().trim().is_empty()
    }
}

fn wire_message(message: &Message) -> openai_client::Message {
    let role = match message.role {
        Role::System => openai_client::Role::System,
        Role::User => openai_client::Role::User,
        Role::Assistant => openai_client::Role::Assistant,
        Role::Tool => openai_client::Role::Tool,
    };
    let mut wire = openai_client::Message::new(role, message.content.clone());
    wire.name = message.name.clone();
    wire.tool_call_id = message.tool_call_id.clone();
    wire
}

/// OpenAI only accepts `[a-zA-Z0-9_-]` in schema names.
fn schema_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "result".to_string()
    } else {
        cleaned
    }
}

fn map_error(err: OpenAIError) -> GenerationError {
    GenerationError::ProviderCall {
        provider: PROVIDER.to_string(),
        retryable: err.is_transient(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResultSchema;
    use serde_json::json;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-5-nano".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            temperature: Some(0.3),
            top_p: None,
            max_output_tokens: Some(256),
            stop: None,
            tools: None,
            tool_choice: None,
            schema: Some(ResultSchema::new(
                "Comparison Result",
                json!({"type": "object", "properties": {"id": {"type": "string"}}}),
            )),
        }
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let provider = OpenAiProvider::new(OpenAIClient::new("sk-test"));
        let wire = serde_json::to_value(provider.chat_request(&request())).unwrap();

        assert_eq!(wire["model"], "gpt-5-nano");
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["response_format"]["type"], "json_schema");
        assert_eq!(wire["response_format"]["json_schema"]["name"], "Comparison_Result");
        assert_eq!(wire["response_format"]["json_schema"]["schema"]["additionalProperties"], false);
        assert!(wire.get("top_p").map_or(true, |v| v.is_null()));
    }

    #[test]
    fn test_non_strict_uses_json_object() {
        let provider = OpenAiProvider::new(OpenAIClient::new("sk-test")).with_strict_schemas(false);
        let wire = serde_json::to_value(provider.chat_request(&request())).unwrap();
        assert_eq!(wire["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        let err = map_error(OpenAIError::Api { status: 503, message: "busy".into() });
        assert!(err.is_retryable());

        let err = map_error(OpenAIError::Api { status: 400, message: "bad".into() });
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("openai API call failed"));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(
                json!({
                    "model": "gpt-5-nano-2025",
                    "choices": [{"message": {"content": "{\"id\": \"a\"}"}, "finish_reason": "stop"}],
                    "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test").with_base_url(server.url());
        let provider = OpenAiProvider::new(client);
        let response = provider.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.model.as_deref(), Some("gpt-5-nano-2025"));
        assert_eq!(response.usage.unwrap().total_tokens, 7);
    }
}
