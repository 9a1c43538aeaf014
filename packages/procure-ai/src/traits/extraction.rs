//! Remote extraction-agent service.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentResult;
use crate::types::{ExtractConfig, RemoteAgent, RemoteExtraction};

/// A hosted service that keeps named, schema-bound agents and runs
/// documents through them.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Fetch an agent by name. Absence is `Ok(None)`, never an error.
    async fn get_agent(&self, name: &str) -> AgentResult<Option<RemoteAgent>>;

    async fn create_agent(
        &self,
        name: &str,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent>;

    /// Replace an existing agent's schema and config in place.
    async fn update_agent(
        &self,
        agent: &RemoteAgent,
        schema: &Value,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent>;

    /// Run the document at `path` through `agent`.
    async fn extract(&self, agent: &RemoteAgent, path: &Path) -> AgentResult<RemoteExtraction>;
}
