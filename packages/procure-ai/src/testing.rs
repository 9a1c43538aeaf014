//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the procurement
//! library without making real LLM or extraction-service calls.

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::{AgentError, AgentResult, GenerationError, Result};
use crate::pipeline::{StagedFile, TempFileStager};
use crate::traits::{ChunkStream, ExtractionService, FileStager, GenerationProvider, RecordSource};
use crate::types::{
    ExtractConfig, ExtractionUsage, Message, ProviderChunk, ProviderRequest, ProviderResponse,
    RemoteAgent, RemoteExtraction, SourceRecord, UploadedFile, Usage,
};

/// A mock generation provider for testing.
///
/// Completion replies are scripted in order; once the script runs out
/// every call returns [`MockProvider::DEFAULT_REPLY`]. Clones share state,
/// so keep a clone to inspect calls after handing one to an adapter.
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    healthy: bool,
    /// Scripted completion replies, consumed front to back
    replies: Arc<Mutex<VecDeque<Result<ProviderResponse>>>>,
    /// Chunks replayed by every stream call
    chunks: Vec<ProviderChunk>,
    stream_usage: Option<Usage>,
    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockProviderCall>>>,
}

/// Record of a call made to the mock provider.
#[derive(Debug, Clone)]
pub enum MockProviderCall {
    Complete {
        model: String,
        messages: Vec<Message>,
        /// Name of the result schema, if one was sent
        schema: Option<String>,
    },
    Stream {
        model: String,
        messages: Vec<Message>,
        schema: Option<String>,
    },
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::named("mock")
    }
}

impl MockProvider {
    pub const DEFAULT_REPLY: &'static str = "mock response";

    pub fn new() -> Self {
        Self::default()
    }

    /// A healthy provider registered under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            replies: Arc::default(),
            chunks: Vec::new(),
            stream_usage: None,
            calls: Arc::default(),
        }
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// Queue a full completion reply.
    pub fn with_response(self, response: ProviderResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a text-only completion reply.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ProviderResponse {
            content: text.into(),
            model: None,
            usage: Some(Usage::new(10, 5)),
        })
    }

    /// Queue a failed completion.
    pub fn with_failure(self, error: GenerationError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Append one plain delta chunk per item.
    pub fn with_stream_deltas(
        mut self,
        deltas: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.chunks
            .extend(deltas.into_iter().map(ProviderChunk::delta));
        self
    }

    pub fn with_stream_chunks(mut self, chunks: Vec<ProviderChunk>) -> Self {
        self.chunks.extend(chunks);
        self
    }

    /// Usage reported on a trailing empty chunk, as OpenAI does.
    pub fn with_stream_usage(mut self, usage: Usage) -> Self {
        self.stream_usage = Some(usage);
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockProviderCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn complete_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockProviderCall::Complete { .. }))
            .count()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn record(&self, call: MockProviderCall) {
        self.calls.write().unwrap().push(call);
    }
}

fn schema_name(request: &ProviderRequest) -> Option<String> {
    request.schema.as_ref().map(|s| s.name.clone())
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.record(MockProviderCall::Complete {
            model: request.model.clone(),
            messages: request.messages.clone(),
            schema: schema_name(request),
        });

        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(ProviderResponse {
                content: Self::DEFAULT_REPLY.to_string(),
                model: None,
                usage: None,
            })
        })
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<ChunkStream> {
        self.record(MockProviderCall::Stream {
            model: request.model.clone(),
            messages: request.messages.clone(),
            schema: schema_name(request),
        });

        let mut chunks = self.chunks.clone();
        if let Some(usage) = self.stream_usage {
            chunks.push(ProviderChunk {
                usage: Some(usage),
                ..Default::default()
            });
        }
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Failure injected into [`MockExtractionService`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MockServiceError(pub String);

/// A mock extraction-agent service for testing.
///
/// Keeps agents in memory, stores whatever schema and config it is given,
/// and returns a fixed payload from every extraction.
#[derive(Default)]
pub struct MockExtractionService {
    agents: RwLock<HashMap<String, RemoteAgent>>,
    data: Value,
    latency: Option<Duration>,
    lookup_failure: Option<String>,
    extract_failure: Option<String>,
    lookups: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    extracts: AtomicUsize,
}

impl MockExtractionService {
    pub fn new() -> Self {
        Self {
            data: json!({}),
            ..Default::default()
        }
    }

    /// Payload returned by every extraction.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Delay applied to lookups and creates, to widen race windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every agent lookup with `message`.
    pub fn with_lookup_failure(mut self, message: impl Into<String>) -> Self {
        self.lookup_failure = Some(message.into());
        self
    }

    /// Fail every extraction with `message`.
    pub fn with_extract_failure(mut self, message: impl Into<String>) -> Self {
        self.extract_failure = Some(message.into());
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn extract_count(&self) -> usize {
        self.extracts.load(Ordering::SeqCst)
    }

    /// Agent currently stored under `name`.
    pub fn agent(&self, name: &str) -> Option<RemoteAgent> {
        self.agents.read().unwrap().get(name).cloned()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn failure(message: &str) -> AgentError {
    AgentError::service(MockServiceError(message.to_string()))
}

#[async_trait]
impl ExtractionService for MockExtractionService {
    async fn get_agent(&self, name: &str) -> AgentResult<Option<RemoteAgent>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(message) = &self.lookup_failure {
            return Err(failure(message));
        }
        Ok(self.agent(name))
    }

    async fn create_agent(
        &self,
        name: &str,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.delay().await;

        let agent = RemoteAgent {
            id: format!("agent-{n}"),
            name: name.to_string(),
            schema: schema.clone(),
            config: Some(config.clone()),
        };
        self.agents
            .write()
            .unwrap()
            .insert(name.to_string(), agent.clone());
        Ok(agent)
    }

    async fn update_agent(
        &self,
        agent: &RemoteAgent,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent> {
        self.updates.fetch_add(1, Ordering::SeqCst);

        let updated = RemoteAgent {
            schema: schema.clone(),
            config: Some(config.clone()),
            ..agent.clone()
        };
        self.agents
            .write()
            .unwrap()
            .insert(agent.name.clone(), updated.clone());
        Ok(updated)
    }

    async fn extract(&self, _agent: &RemoteAgent, path: &Path) -> AgentResult<RemoteExtraction> {
        self.extracts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.extract_failure {
            return Err(failure(message));
        }
        if !path.exists() {
            return Err(failure(&format!("staged file {} does not exist", path.display())));
        }
        Ok(RemoteExtraction {
            data: self.data.clone(),
            usage: ExtractionUsage {
                pages: 1,
                document_tokens: 100,
                output_tokens: 20,
            },
        })
    }
}

/// Stages into real temp files and counts stage and release events.
#[derive(Default)]
pub struct RecordingStager {
    inner: TempFileStager,
    staged: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl RecordingStager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged(&self) -> usize {
        self.staged.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStager for RecordingStager {
    async fn stage(&self, file: &UploadedFile) -> std::io::Result<StagedFile> {
        let staged = self.inner.stage(file).await?;
        self.staged.fetch_add(1, Ordering::SeqCst);

        let released = Arc::clone(&self.released);
        Ok(staged.with_release_hook(move |_| {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// In-memory [`RecordSource`] keyed by parent id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: HashMap<String, Vec<SourceRecord>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(
        mut self,
        parent_id: impl Into<String>,
        records: Vec<SourceRecord>,
    ) -> Self {
        self.records.insert(parent_id.into(), records);
        self
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    type Error = Infallible;

    async fn list_records_by(
        &self,
        parent_id: &str,
    ) -> std::result::Result<Vec<SourceRecord>, Infallible> {
        Ok(self.records.get(parent_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationRequest;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-5-nano".into(),
            messages: GenerationRequest::prompt("hi").normalized_messages().unwrap(),
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            stop: None,
            tools: None,
            tool_choice: None,
            schema: None,
        }
    }

    #[tokio::test]
    async fn test_mock_provider_replays_script_then_default() {
        let mock = MockProvider::new()
            .with_text("first")
            .with_failure(GenerationError::provider_call("mock", "down"));

        assert_eq!(mock.complete(&request()).await.unwrap().content, "first");
        assert!(mock.complete(&request()).await.is_err());
        assert_eq!(
            mock.complete(&request()).await.unwrap().content,
            MockProvider::DEFAULT_REPLY
        );
        assert_eq!(mock.complete_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_stream_appends_usage_chunk() {
        let mock = MockProvider::new()
            .with_stream_usage(Usage::new(1, 2))
            .with_stream_deltas(["a", "b"]);

        let chunks: Vec<_> = mock.stream(&request()).await.unwrap().collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].as_ref().unwrap().usage, Some(Usage::new(1, 2)));
    }

    #[tokio::test]
    async fn test_recording_stager_counts_release() {
        let stager = RecordingStager::new();
        let file = UploadedFile::new("quote.pdf", Some("application/pdf"), b"%PDF".to_vec());

        let staged = tokio_test::assert_ok!(stager.stage(&file).await);
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(stager.staged(), 1);

        drop(staged);
        assert!(!path.exists());
        assert_eq!(stager.released(), 1);
    }
}
