//! Pure LlamaCloud Extract REST API client.
//!
//! A minimal client for the hosted extraction-agent API. Supports looking up,
//! creating and updating named agents, uploading files, and running
//! extraction jobs to completion.
//!
//! # Example
//!
//! ```rust,ignore
//! use llama_extract_client::{ExtractConfig, LlamaExtractClient, LlamaExtractSettings};
//!
//! let client = LlamaExtractClient::new(LlamaExtractSettings::from_env())?;
//!
//! let agent = match client.get_agent_by_name("fleet-ai-quote-extractor").await? {
//!     Some(agent) => agent,
//!     None => client.create_agent("fleet-ai-quote-extractor", &schema, &ExtractConfig::default()).await?,
//! };
//! let run = client.extract_file(&agent.id, "quote.pdf").await?;
//! println!("{}", run.data);
//! ```

pub mod error;
pub mod types;

pub use error::{LlamaExtractError, Result};
pub use types::{
    ChunkMode, ExtractConfig, ExtractJob, ExtractMode, ExtractRun, ExtractTarget, ExtractUsage,
    ExtractionAgent, FileObject, JobStatus,
};

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use types::{CreateAgentRequest, CreateJobRequest, UpdateAgentRequest};

const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// Connection settings. Every field except `base_url` is required.
#[derive(Clone, Default)]
pub struct LlamaExtractSettings {
    pub api_key: Option<String>,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
    pub base_url: Option<String>,
}

impl LlamaExtractSettings {
    /// Read `LLAMA_CLOUD_API_KEY`, `LLAMA_ORGANIZATION_ID`,
    /// `LLAMA_EXTRACT_PROJECT_ID` and `LLAMA_BASE_URL`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var("LLAMA_CLOUD_API_KEY"),
            organization_id: var("LLAMA_ORGANIZATION_ID"),
            project_id: var("LLAMA_EXTRACT_PROJECT_ID"),
            base_url: var("LLAMA_BASE_URL"),
        }
    }

    /// Names of the required settings that are absent.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("LLAMA_CLOUD_API_KEY", &self.api_key),
            ("LLAMA_ORGANIZATION_ID", &self.organization_id),
            ("LLAMA_EXTRACT_PROJECT_ID", &self.project_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }
}

impl std::fmt::Debug for LlamaExtractSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamaExtractSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct LlamaExtractClient {
    client: reqwest::Client,
    api_key: String,
    organization_id: String,
    project_id: String,
    base_url: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl LlamaExtractClient {
    /// Build a client, failing fast when any required setting is missing.
    pub fn new(settings: LlamaExtractSettings) -> Result<Self> {
        let missing = settings.missing();
        if !missing.is_empty() {
            return Err(LlamaExtractError::Config(format!(
                "Missing required Llama Cloud settings: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.unwrap_or_default(),
            organization_id: settings.organization_id.unwrap_or_default(),
            project_id: settings.project_id.unwrap_or_default(),
            base_url: settings
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(600),
        })
    }

    /// Override how often and how long job status is polled.
    pub fn with_polling(mut self, interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = interval;
        self.max_wait = max_wait;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Look up an agent by name. A 404 is `Ok(None)`.
    pub async fn get_agent_by_name(&self, name: &str) -> Result<Option<ExtractionAgent>> {
        let url = format!(
            "{}/api/v1/extraction/extraction-agents/by-name/{}",
            self.base_url, name
        );
        match self.send_json(self.scoped(self.client.get(&url))).await {
            Ok(agent) => Ok(Some(agent)),
            Err(e) if e.is_not_found() => {
                tracing::debug!(name, "Extraction agent not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_agent(
        &self,
        name: &str,
        data_schema: &Value,
        config: &ExtractConfig,
    ) -> Result<ExtractionAgent> {
        let url = format!("{}/api/v1/extraction/extraction-agents", self.base_url);
        let body = CreateAgentRequest {
            name,
            data_schema,
            config,
        };
        let agent: ExtractionAgent = self
            .send_json(self.scoped(self.client.post(&url)).json(&body))
            .await?;
        tracing::info!(agent_id = %agent.id, name, "Created extraction agent");
        Ok(agent)
    }

    /// Replace an agent's schema and config.
    pub async fn update_agent(
        &self,
        agent_id: &str,
        data_schema: &Value,
        config: &ExtractConfig,
    ) -> Result<ExtractionAgent> {
        let url = format!(
            "{}/api/v1/extraction/extraction-agents/{}",
            self.base_url, agent_id
        );
        let body = UpdateAgentRequest {
            data_schema,
            config,
        };
        self.send_json(self.client.put(&url).bearer_auth(&self.api_key).json(&body))
            .await
    }

    /// Upload a local file into the project.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<FileObject> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let form = reqwest::multipart::Form::new().part(
            "upload_file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        );

        let url = format!("{}/api/v1/files", self.base_url);
        self.send_json(self.scoped(self.client.post(&url)).multipart(form))
            .await
    }

    pub async fn create_job(&self, agent_id: &str, file_id: &str) -> Result<ExtractJob> {
        let url = format!("{}/api/v1/extraction/jobs", self.base_url);
        let body = CreateJobRequest {
            extraction_agent_id: agent_id,
            file_id,
        };
        self.send_json(self.client.post(&url).bearer_auth(&self.api_key).json(&body))
            .await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<ExtractJob> {
        let url = format!("{}/api/v1/extraction/jobs/{}", self.base_url, job_id);
        self.send_json(self.client.get(&url).bearer_auth(&self.api_key))
            .await
    }

    /// Poll until a job reaches a terminal status.
    pub async fn wait_for_job(&self, job_id: &str) -> Result<ExtractJob> {
        let started = Instant::now();
        loop {
            let job = self.get_job(job_id).await?;
            match job.status {
                JobStatus::Success | JobStatus::PartialSuccess => return Ok(job),
                JobStatus::Error | JobStatus::Cancelled => {
                    return Err(LlamaExtractError::JobFailed {
                        job_id: job.id,
                        status: format!("{:?}", job.status),
                        message: job.error.unwrap_or_default(),
                    });
                }
                JobStatus::Pending | JobStatus::Unknown => {
                    if started.elapsed() >= self.max_wait {
                        return Err(LlamaExtractError::Timeout {
                            job_id: job_id.to_string(),
                            waited_secs: started.elapsed().as_secs(),
                        });
                    }
                    tracing::debug!(job_id, status = ?job.status, "Extraction job still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    pub async fn get_job_result(&self, job_id: &str) -> Result<ExtractRun> {
        let url = format!("{}/api/v1/extraction/jobs/{}/result", self.base_url, job_id);
        let mut run: ExtractRun = self
            .send_json(self.client.get(&url).bearer_auth(&self.api_key))
            .await?;
        run.job_id.get_or_insert_with(|| job_id.to_string());
        Ok(run)
    }

    /// Upload, run and collect an extraction end-to-end.
    pub async fn extract_file(&self, agent_id: &str, path: impl AsRef<Path>) -> Result<ExtractRun> {
        let file = self.upload_file(path).await?;
        tracing::info!(file_id = %file.id, agent_id, "Uploaded file, starting extraction job");

        let job = self.create_job(agent_id, &file.id).await?;
        let finished = self.wait_for_job(&job.id).await?;

        let run = self.get_job_result(&finished.id).await?;
        tracing::info!(job_id = %finished.id, "Extraction job finished");
        Ok(run)
    }

    fn scoped(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_key).query(&[
            ("project_id", self.project_id.as_str()),
            ("organization_id", self.organization_id.as_str()),
        ])
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp: Response = builder.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlamaExtractError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn settings(base_url: &str) -> LlamaExtractSettings {
        LlamaExtractSettings {
            api_key: Some("llx-test".into()),
            organization_id: Some("org-1".into()),
            project_id: Some("proj-1".into()),
            base_url: Some(base_url.to_string()),
        }
    }

    #[test]
    fn test_missing_settings_are_listed() {
        let err = LlamaExtractClient::new(LlamaExtractSettings {
            api_key: Some("llx".into()),
            ..Default::default()
        })
        .err()
        .unwrap();

        let message = err.to_string();
        assert!(message.contains("Missing required Llama Cloud settings"));
        assert!(message.contains("LLAMA_ORGANIZATION_ID"));
        assert!(message.contains("LLAMA_EXTRACT_PROJECT_ID"));
        assert!(!message.contains("LLAMA_CLOUD_API_KEY"));
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let debug = format!("{:?}", settings("http://x"));
        assert!(!debug.contains("llx-test"));
    }

    #[tokio::test]
    async fn test_get_agent_404_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock(
                "GET",
                "/api/v1/extraction/extraction-agents/by-name/fleet-ai-quote-extractor",
            )
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"detail":"not found"}"#)
            .create_async()
            .await;

        let client = LlamaExtractClient::new(settings(&server.url())).unwrap();
        let agent = client
            .get_agent_by_name("fleet-ai-quote-extractor")
            .await
            .unwrap();
        assert!(agent.is_none());
    }

    #[tokio::test]
    async fn test_get_agent_server_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex("^/api/v1/extraction/extraction-agents/by-name/.*".into()))
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = LlamaExtractClient::new(settings(&server.url())).unwrap();
        let err = client.get_agent_by_name("agent-x").await.unwrap_err();
        assert!(matches!(err, LlamaExtractError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_extract_file_runs_job_to_completion() {
        let mut server = mockito::Server::new_async().await;
        let _upload = server
            .mock("POST", "/api/v1/files")
            .match_query(Matcher::Any)
            .with_body(r#"{"id":"file-1","name":"quote.pdf"}"#)
            .create_async()
            .await;
        let _job = server
            .mock("POST", "/api/v1/extraction/jobs")
            .match_body(Matcher::PartialJson(json!({
                "extraction_agent_id": "agent-1",
                "file_id": "file-1"
            })))
            .with_body(r#"{"id":"job-1","status":"PENDING"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/api/v1/extraction/jobs/job-1")
            .with_body(r#"{"id":"job-1","status":"SUCCESS"}"#)
            .create_async()
            .await;
        let _result = server
            .mock("GET", "/api/v1/extraction/jobs/job-1/result")
            .with_body(
                r#"{"data":{"rfq_number":"RS225"},"extraction_metadata":{"usage":{"num_pages_extracted":1}}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quote.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let client = LlamaExtractClient::new(settings(&server.url()))
            .unwrap()
            .with_polling(Duration::from_millis(1), Duration::from_secs(5));
        let run = client.extract_file("agent-1", &path).await.unwrap();

        assert_eq!(run.data["rfq_number"], "RS225");
        assert_eq!(run.job_id.as_deref(), Some("job-1"));
        assert_eq!(run.usage().num_pages_extracted, 1);
    }

    #[tokio::test]
    async fn test_failed_job_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _status = server
            .mock("GET", "/api/v1/extraction/jobs/job-9")
            .with_body(r#"{"id":"job-9","status":"ERROR","error":"unreadable document"}"#)
            .create_async()
            .await;

        let client = LlamaExtractClient::new(settings(&server.url())).unwrap();
        let err = client.wait_for_job("job-9").await.unwrap_err();

        match err {
            LlamaExtractError::JobFailed { message, .. } => {
                assert_eq!(message, "unreadable document")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
