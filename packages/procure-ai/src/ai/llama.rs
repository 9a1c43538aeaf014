//! LlamaCloud Extract as an [`ExtractionService`].

use std::path::Path;

use async_trait::async_trait;
use llama_extract_client::{ExtractionAgent, LlamaExtractClient, LlamaExtractSettings};
use serde_json::Value;

use crate::error::{AgentError, AgentResult, ConfigError};
use crate::traits::ExtractionService;
use crate::types::{ExtractConfig, RemoteAgent, RemoteExtraction};

/// Hosted extraction agents backed by LlamaCloud.
#[derive(Clone)]
pub struct LlamaExtractService {
    client: LlamaExtractClient,
}

impl LlamaExtractService {
    pub fn new(client: LlamaExtractClient) -> Self {
        Self { client }
    }

    /// Build a client from settings, listing every missing one on failure.
    pub fn from_settings(settings: LlamaExtractSettings) -> AgentResult<Self> {
        let missing = settings.missing();
        if !missing.is_empty() {
            let missing = missing.into_iter().map(String::from).collect();
            return Err(ConfigError::Missing(missing).into());
        }
        let client = LlamaExtractClient::new(settings).map_err(AgentError::service)?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &LlamaExtractClient {
        &self.client
    }
}

impl From<ExtractionAgent> for RemoteAgent {
    fn from(agent: ExtractionAgent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            schema: agent.data_schema,
            config: agent.config,
        }
    }
}

#[async_trait]
impl ExtractionService for LlamaExtractService {
    async fn get_agent(&self, name: &str) -> AgentResult<Option<RemoteAgent>> {
        let agent = self
            .client
            .get_agent_by_name(name)
            .await
            .map_err(AgentError::service)?;
        Ok(agent.map(Into::into))
    }

    async fn create_agent(
        &self,
        name: &str,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent> {
        let agent = self
            .client
            .create_agent(name, schema, config)
            .await
            .map_err(AgentError::service)?;
        Ok(agent.into())
    }

    async fn update_agent(
        &self,
        agent: &RemoteAgent,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent> {
        let updated = self
            .client
            .update_agent(&agent.id, schema, config)
            .await
            .map_err(AgentError::service)?;
        Ok(updated.into())
    }

    async fn extract(&self, agent: &RemoteAgent, path: &Path) -> AgentResult<RemoteExtraction> {
        let run = self
            .client
            .extract_file(&agent.id, path)
            .await
            .map_err(AgentError::service)?;
        Ok(RemoteExtraction {
            usage: run.usage().into(),
            data: run.data,
        })
    }
}
