//! Provider-agnostic generation adapter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::error::{GenerationError, Result};
use crate::generation::retry::{run_with_retry, RetryPolicy};
use crate::traits::GenerationProvider;
use crate::types::{
    GenerationRequest, GenerationResult, ProviderRequest, ResultSchema, Structured, Usage,
};

/// Stream of cumulative generation results.
pub type GenerationStream = BoxStream<'static, Result<GenerationResult>>;

/// Values applied when a request leaves a parameter unset.
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Upper bound for one non-streaming call, retries included
    pub request_timeout: Option<Duration>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-5-nano".to_string(),
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            request_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl GenerationDefaults {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Uniform entry point over any [`GenerationProvider`].
///
/// Normalizes requests, applies defaults, validates structured output,
/// retries transient failures and accumulates streamed deltas.
#[derive(Clone)]
pub struct GenerationAdapter {
    provider: Arc<dyn GenerationProvider>,
    defaults: GenerationDefaults,
    retry: RetryPolicy,
}

impl GenerationAdapter {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            defaults: GenerationDefaults::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    /// Resolve a request into what the provider will see.
    pub fn prepare(
        &self,
        schema: Option<&ResultSchema>,
        request: &GenerationRequest,
    ) -> Result<ProviderRequest> {
        request.validate()?;
        let messages = request.normalized_messages()?;

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.defaults.model)
            .to_string();

        Ok(ProviderRequest {
            model,
            messages,
            temperature: request.temperature.or(self.defaults.temperature),
            top_p: request.top_p.or(self.defaults.top_p),
            max_output_tokens: request.max_output_tokens.or(self.defaults.max_output_tokens),
            stop: (!request.stop.is_empty()).then(|| request.stop.clone()),
            tools: (!request.tools.is_empty()).then(|| request.tools.clone()),
            tool_choice: request.tool_choice.clone(),
            schema: schema.cloned(),
        })
    }

    /// One-shot generation.
    pub async fn generate(
        &self,
        schema: Option<&ResultSchema>,
        request: GenerationRequest,
    ) -> Result<GenerationResult> {
        self.generate_with(schema, request, &CallContext::default())
            .await
    }

    /// One-shot generation under a cancellation token and deadline.
    ///
    /// With a schema, the content must parse and validate or the call fails
    /// with [`GenerationError::SchemaValidation`]. Without one, an empty
    /// reply is a provider failure.
    pub async fn generate_with(
        &self,
        schema: Option<&ResultSchema>,
        request: GenerationRequest,
        ctx: &CallContext,
    ) -> Result<GenerationResult> {
        let prepared = self.prepare(schema, &request)?;
        let ctx = self.bounded(ctx);
        let provider = self.provider.name();
        let started = Instant::now();

        let response = run_with_retry(&self.retry, provider, &ctx, || {
            self.provider.complete(&prepared)
        })
        .await?;

        let model = response
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| prepared.model.clone());
        let usage = response.usage.unwrap_or_default();

        debug!(
            provider,
            model = %model,
            duration_ms = started.elapsed().as_millis() as u64,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Generation completed"
        );

        let parsed = match schema {
            Some(schema) => Some(schema.parse(&response.content).map_err(|reason| {
                warn!(provider, schema = %schema.name, %reason, "Structured output rejected");
                GenerationError::SchemaValidation { reason }
            })?),
            None if response.content.trim().is_empty() => {
                return Err(GenerationError::provider_call(provider, "Empty response"));
            }
            None => None,
        };

        Ok(GenerationResult {
            content: response.content,
            parsed,
            usage,
            model,
            is_final: true,
        })
    }

    /// Generate and deserialize into `T`, using `T`'s strict schema.
    pub async fn generate_structured<T>(&self, request: GenerationRequest) -> Result<Structured<T>>
    where
        T: DeserializeOwned + JsonSchema,
    {
        self.generate_structured_with(request, &CallContext::default())
            .await
    }

    pub async fn generate_structured_with<T>(
        &self,
        request: GenerationRequest,
        ctx: &CallContext,
    ) -> Result<Structured<T>>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = ResultSchema::of::<T>();
        let result = self.generate_with(Some(&schema), request, ctx).await?;
        let parsed = result.parsed.clone().unwrap_or_default();
        let value = serde_json::from_value(parsed).map_err(|e| GenerationError::SchemaValidation {
            reason: format!("does not deserialize into {}: {e}", schema.name),
        })?;
        Ok(Structured { value, result })
    }

    /// Streaming generation.
    ///
    /// Each element's content is the previous element's content plus one
    /// delta. The last element has `is_final` set and carries the
    /// provider's terminal usage. With a schema, the final text is
    /// validated; on failure it is returned raw with `parsed: None`.
    /// Dropping the stream stops generation.
    pub fn stream_generate(
        &self,
        schema: Option<&ResultSchema>,
        request: GenerationRequest,
    ) -> GenerationStream {
        self.stream_generate_with(schema, request, CallContext::default())
    }

    pub fn stream_generate_with(
        &self,
        schema: Option<&ResultSchema>,
        request: GenerationRequest,
        ctx: CallContext,
    ) -> GenerationStream {
        let prepared = self.prepare(schema, &request);
        let connect_ctx = self.bounded(&ctx);
        Box::pin(accumulate(
            Arc::clone(&self.provider),
            self.retry.clone(),
            prepared,
            schema.cloned(),
            connect_ctx,
            ctx,
        ))
    }

    fn bounded(&self, ctx: &CallContext) -> CallContext {
        match self.defaults.request_timeout {
            Some(timeout) => ctx.bounded_by(timeout),
            None => ctx.clone(),
        }
    }
}

/// Drive a provider stream, yielding cumulative snapshots one step late so
/// the last one can be replaced by the final element.
fn accumulate(
    provider: Arc<dyn GenerationProvider>,
    retry: RetryPolicy,
    prepared: Result<ProviderRequest>,
    schema: Option<ResultSchema>,
    connect_ctx: CallContext,
    ctx: CallContext,
) -> impl Stream<Item = Result<GenerationResult>> + Send + 'static {
    try_stream! {
        let prepared = prepared?;
        let name = provider.name().to_string();

        let mut chunks =
            run_with_retry(&retry, &name, &connect_ctx, || provider.stream(&prepared)).await?;

        let mut model = prepared.model.clone();
        let mut content = String::new();
        let mut usage: Option<Usage> = None;
        let mut pending: Option<GenerationResult> = None;

        while let Some(chunk) = ctx.guard(chunks.next()).await.map_err(GenerationError::from)? {
            let chunk = chunk?;
            if let Some(m) = chunk.model.filter(|m| !m.is_empty()) {
                model = m;
            }
            if chunk.usage.is_some() {
                usage = chunk.usage;
            }
            if chunk.delta.is_empty() {
                continue;
            }

            content.push_str(&chunk.delta);
            let snapshot = GenerationResult {
                content: content.clone(),
                parsed: None,
                usage: Usage::default(),
                model: model.clone(),
                is_final: false,
            };
            if let Some(previous) = pending.replace(snapshot) {
                yield previous;
            }
        }

        let parsed = match &schema {
            Some(schema) => match schema.parse(&content) {
                Ok(value) => Some(value),
                Err(reason) => {
                    warn!(
                        provider = %name,
                        schema = %schema.name,
                        %reason,
                        "Streamed output failed validation, returning raw text"
                    );
                    None
                }
            },
            None => None,
        };

        debug!(
            provider = %name,
            model = %model,
            chars = content.len(),
            "Generation stream finished"
        );

        yield GenerationResult {
            content,
            parsed,
            usage: usage.unwrap_or_default(),
            model,
            is_final: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, MockProviderCall};
    use crate::types::{Message, ProviderChunk, ProviderResponse};
    use serde::Deserialize;
    use serde_json::json;

    fn adapter(mock: MockProvider) -> (GenerationAdapter, MockProvider) {
        let handle = mock.clone();
        (
            GenerationAdapter::new(Arc::new(mock)).with_retry(RetryPolicy::none()),
            handle,
        )
    }

    #[test]
    fn test_prepare_resolves_defaults_and_omits_unset() {
        let (adapter, _) = adapter(MockProvider::new());
        let adapter = adapter.with_defaults(GenerationDefaults::default().with_temperature(0.2));

        let prepared = adapter.prepare(None, &GenerationRequest::prompt("hi")).unwrap();
        assert_eq!(prepared.model, "gpt-5-nano");
        assert_eq!(prepared.temperature, Some(0.2));
        assert_eq!(prepared.top_p, None);
        assert_eq!(prepared.max_output_tokens, None);
        assert!(prepared.stop.is_none());
        assert!(prepared.tools.is_none());

        let request = GenerationRequest::prompt("hi")
            .with_model("gpt-4o")
            .with_temperature(1.0);
        let prepared = adapter.prepare(None, &request).unwrap();
        assert_eq!(prepared.model, "gpt-4o");
        assert_eq!(prepared.temperature, Some(1.0));
    }

    #[tokio::test]
    async fn test_generate_fills_usage_and_model() {
        let (adapter, mock) = adapter(MockProvider::new().with_response(ProviderResponse {
            content: "hello".into(),
            model: None,
            usage: None,
        }));

        let result = adapter.generate(None, GenerationRequest::prompt("hi")).await.unwrap();

        assert_eq!(result.content, "hello");
        assert_eq!(result.usage, Usage::default());
        assert_eq!(result.model, "gpt-5-nano");
        assert!(result.is_final);
        assert_eq!(mock.complete_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_request_without_calling_provider() {
        let (adapter, mock) = adapter(MockProvider::new());
        let err = adapter.generate(None, GenerationRequest::default()).await.unwrap_err();

        assert!(matches!(err, GenerationError::EmptyRequest));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_schema_output_is_parsed() {
        #[derive(Debug, Deserialize, JsonSchema)]
        struct Vendor {
            name: String,
        }

        let (adapter, mock) = adapter(MockProvider::new().with_text(r#"{"name": "Acme"}"#));
        let out = adapter
            .generate_structured::<Vendor>(GenerationRequest::messages(vec![Message::user("who?")]))
            .await
            .unwrap();

        assert_eq!(out.value.name, "Acme");
        assert_eq!(out.result.parsed, Some(json!({"name": "Acme"})));
        match &mock.calls()[0] {
            MockProviderCall::Complete { schema, .. } => {
                assert_eq!(schema.as_deref(), Some("Vendor"))
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_schema_violation_is_an_error_on_sync_path() {
        let schema = ResultSchema::new(
            "Winner",
            json!({"type": "object", "required": ["id"], "properties": {"id": {"type": "string"}}}),
        );
        let (adapter, _) = adapter(MockProvider::new().with_text(r#"{"winner": 1}"#));

        let err = adapter
            .generate(Some(&schema), GenerationRequest::prompt("pick"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn test_empty_reply_without_schema_is_provider_error() {
        let (adapter, _) = adapter(MockProvider::new().with_text("   "));
        let err = adapter.generate(None, GenerationRequest::prompt("hi")).await.unwrap_err();
        assert!(err.to_string().contains("Empty response"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_by_default_policy() {
        let mock = MockProvider::new()
            .with_failure(GenerationError::ProviderCall {
                provider: "mock".into(),
                message: "503".into(),
                retryable: true,
            })
            .with_text("ok");
        let handle = mock.clone();
        let adapter = GenerationAdapter::new(Arc::new(mock));

        let result = adapter.generate(None, GenerationRequest::prompt("hi")).await.unwrap();
        assert_eq!(result.content, "ok");
        assert_eq!(handle.complete_count(), 2);
    }

    #[tokio::test]
    async fn test_stream_accumulates_prefixes() {
        let (adapter, _) = adapter(
            MockProvider::new()
                .with_stream_deltas(["Once", " upon", " a time"])
                .with_stream_usage(Usage::new(4, 3)),
        );

        let results: Vec<_> = adapter
            .stream_generate(None, GenerationRequest::prompt("tell me a story"))
            .collect()
            .await;
        let results: Vec<GenerationResult> = results.into_iter().map(|r| r.unwrap()).collect();

        let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, ["Once", "Once upon", "Once upon a time"]);

        let last = results.last().unwrap();
        assert!(last.is_final);
        assert_eq!(last.usage, Usage::new(4, 3));
        assert!(results[..2].iter().all(|r| !r.is_final));
    }

    #[tokio::test]
    async fn test_stream_tolerates_schema_failure() {
        let schema = ResultSchema::new("Obj", json!({"type": "object"}));
        let (adapter, _) = adapter(MockProvider::new().with_stream_deltas(["not ", "json"]));

        let results: Vec<_> = adapter
            .stream_generate(Some(&schema), GenerationRequest::prompt("x"))
            .collect()
            .await;
        let last = results.last().unwrap().as_ref().unwrap();

        assert_eq!(last.content, "not json");
        assert_eq!(last.parsed, None);
    }

    #[tokio::test]
    async fn test_stream_parses_valid_final_text() {
        let schema = ResultSchema::new("Obj", json!({"type": "object"}));
        let (adapter, _) = adapter(MockProvider::new().with_stream_deltas(["{\"a\":", " 1}"]));

        let results: Vec<_> = adapter
            .stream_generate(Some(&schema), GenerationRequest::prompt("x"))
            .collect()
            .await;
        let last = results.last().unwrap().as_ref().unwrap();
        assert_eq!(last.parsed, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_stream_model_comes_from_chunks() {
        let (adapter, _) = adapter(MockProvider::new().with_stream_chunks(vec![
            ProviderChunk {
                delta: "hi".into(),
                model: Some("gpt-5-nano-2025".into()),
                usage: None,
            },
        ]));

        let results: Vec<_> = adapter
            .stream_generate(None, GenerationRequest::prompt("x"))
            .collect()
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().model, "gpt-5-nano-2025");
    }

    #[tokio::test]
    async fn test_cancelled_stream_ends_with_error() {
        let (adapter, _) = adapter(MockProvider::new().with_stream_deltas(["a", "b"]));
        let ctx = CallContext::new();
        ctx.cancel();

        let results: Vec<_> = adapter
            .stream_generate_with(None, GenerationRequest::prompt("x"), ctx)
            .collect()
            .await;
        assert!(matches!(results.last(), Some(Err(GenerationError::Cancelled))));
    }

    #[tokio::test]
    async fn test_stream_flag_does_not_switch_generate_to_streaming() {
        let (adapter, mock) = adapter(MockProvider::new().with_text("whole reply"));
        let mut request = GenerationRequest::prompt("hi");
        request.stream = true;

        let result = adapter.generate(None, request).await.unwrap();

        assert_eq!(result.content, "whole reply");
        assert!(result.is_final);
        assert_eq!(mock.complete_count(), 1);
        assert!(matches!(mock.calls()[0], MockProviderCall::Complete { .. }));
    }
}
