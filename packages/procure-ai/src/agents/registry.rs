//! Idempotent lookup-or-create of named extraction agents.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{AgentError, AgentResult};
use crate::traits::ExtractionService;
use crate::types::{ExtractConfig, ExtractionAgentSpec, RemoteAgent};

/// What [`ExtractionAgentRegistry::sync_all`] did for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Result of a batch sync: outcomes for the agents that succeeded and the
/// errors for those that did not.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<(String, SyncOutcome)>,
    pub failures: Vec<(String, AgentError)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Keeps remote extraction agents in step with local specs.
///
/// Calls for the same name are serialized inside one registry, so two
/// concurrent first uses create one agent, not two. Across processes this
/// relies on the remote service rejecting duplicate names.
pub struct ExtractionAgentRegistry {
    service: Arc<dyn ExtractionService>,
    sync_schema: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ExtractionAgentRegistry {
    pub fn new(service: Arc<dyn ExtractionService>) -> Self {
        Self {
            service,
            sync_schema: false,
            locks: DashMap::new(),
        }
    }

    /// Push local schema changes to agents found on the service.
    pub fn with_schema_sync(mut self, enabled: bool) -> Self {
        self.sync_schema = enabled;
        self
    }

    pub fn syncs_schema(&self) -> bool {
        self.sync_schema
    }

    pub fn service(&self) -> &Arc<dyn ExtractionService> {
        &self.service
    }

    /// Return the agent called `name`, creating it if absent.
    ///
    /// An existing agent is updated only when schema sync is on and its
    /// schema differs from `schema`.
    pub async fn get_or_create(
        &self,
        name: &str,
        schema: &Value,
        system_prompt: &str,
        config: &ExtractConfig,
    ) -> AgentResult<RemoteAgent> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let config = config.clone().with_system_prompt(system_prompt);

        if let Some(agent) = self.service.get_agent(name).await? {
            if self.sync_schema && agent.schema != *schema {
                let updated = self.service.update_agent(&agent, schema, &config).await?;
                info!(agent = name, agent_id = %updated.id, "Updated extraction agent schema");
                return Ok(updated);
            }
            return Ok(agent);
        }

        let agent = self.service.create_agent(name, schema, &config).await?;
        info!(agent = name, agent_id = %agent.id, "Created extraction agent");
        Ok(agent)
    }

    /// [`get_or_create`](Self::get_or_create) for a spec.
    pub async fn ensure(&self, spec: &ExtractionAgentSpec) -> AgentResult<RemoteAgent> {
        self.get_or_create(&spec.name, &spec.schema, &spec.system_prompt, &spec.config)
            .await
    }

    /// Bring every spec's agent up to date, ignoring the sync flag.
    ///
    /// Failures are collected per agent; one bad agent does not stop the rest.
    pub async fn sync_all<'a>(
        &self,
        specs: impl IntoIterator<Item = &'a ExtractionAgentSpec>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for spec in specs {
            match self.sync_one(spec).await {
                Ok(outcome) => {
                    info!(agent = %spec.name, %outcome, "Extraction agent synced");
                    report.outcomes.push((spec.name.clone(), outcome));
                }
                Err(e) => {
                    error!(agent = %spec.name, error = %e, "Extraction agent sync failed");
                    report.failures.push((spec.name.clone(), e));
                }
            }
        }

        report
    }

    async fn sync_one(&self, spec: &ExtractionAgentSpec) -> AgentResult<SyncOutcome> {
        let lock = self.lock_for(&spec.name);
        let _guard = lock.lock().await;

        match self.service.get_agent(&spec.name).await? {
            Some(agent) => {
                let current =
                    agent.schema == spec.schema && agent.config.as_ref() == Some(&spec.config);
                if current {
                    return Ok(SyncOutcome::Unchanged);
                }
                self.service
                    .update_agent(&agent, &spec.schema, &spec.config)
                    .await?;
                Ok(SyncOutcome::Updated)
            }
            None => {
                self.service
                    .create_agent(&spec.name, &spec.schema, &spec.config)
                    .await?;
                Ok(SyncOutcome::Created)
            }
        }
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExtractionService;
    use serde_json::json;

    fn spec(schema: Value) -> ExtractionAgentSpec {
        ExtractionAgentSpec::new("fleet-ai-quote-extractor", "Quote", schema, "Extract quotes.")
    }

    #[tokio::test]
    async fn test_creates_when_absent() {
        let service = Arc::new(MockExtractionService::new());
        let registry = ExtractionAgentRegistry::new(service.clone());

        let agent = registry.ensure(&spec(json!({"type": "object"}))).await.unwrap();

        assert_eq!(agent.name, "fleet-ai-quote-extractor");
        assert_eq!(service.create_count(), 1);
        let config = agent.config.unwrap();
        assert!(config.high_resolution_mode);
        assert!(!config.invalidate_cache);
        assert_eq!(config.system_prompt.as_deref(), Some("Extract quotes."));
    }

    #[tokio::test]
    async fn test_second_call_reuses_agent() {
        let service = Arc::new(MockExtractionService::new());
        let registry = ExtractionAgentRegistry::new(service.clone());
        let spec = spec(json!({"type": "object"}));

        let first = registry.ensure(&spec).await.unwrap();
        let second = registry.ensure(&spec).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(service.create_count(), 1);
        assert_eq!(service.update_count(), 0);
    }

    #[tokio::test]
    async fn test_schema_drift_updates_only_when_enabled() {
        let service = Arc::new(MockExtractionService::new());
        ExtractionAgentRegistry::new(service.clone())
            .ensure(&spec(json!({"type": "object"})))
            .await
            .unwrap();

        let changed = spec(json!({"type": "object", "required": ["quotes"]}));

        let off = ExtractionAgentRegistry::new(service.clone());
        let agent = off.ensure(&changed).await.unwrap();
        assert_eq!(agent.schema, json!({"type": "object"}));
        assert_eq!(service.update_count(), 0);

        let on = ExtractionAgentRegistry::new(service.clone()).with_schema_sync(true);
        let agent = on.ensure(&changed).await.unwrap();
        assert_eq!(agent.schema, changed.schema);
        assert_eq!(service.update_count(), 1);

        on.ensure(&changed).await.unwrap();
        assert_eq!(service.update_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let service =
            Arc::new(MockExtractionService::new().with_lookup_failure("503 Service Unavailable"));
        let registry = ExtractionAgentRegistry::new(service.clone());

        let err = registry.ensure(&spec(json!({}))).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(service.create_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_creates_once() {
        let service = Arc::new(
            MockExtractionService::new().with_latency(std::time::Duration::from_millis(20)),
        );
        let registry = Arc::new(ExtractionAgentRegistry::new(service.clone()));
        let spec = spec(json!({"type": "object"}));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let spec = spec.clone();
                tokio::spawn(async move { registry.ensure(&spec).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(service.create_count(), 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_sync_all_reports_each_outcome() {
        let service = Arc::new(MockExtractionService::new());
        let registry = ExtractionAgentRegistry::new(service.clone());

        let quote = spec(json!({"type": "object"}));
        let rfq = ExtractionAgentSpec::new(
            "fleet-ai-rfq-extractor",
            "RFQ",
            json!({"type": "object"}),
            "Extract RFQs.",
        );
        registry.ensure(&quote).await.unwrap();
        registry.ensure(&rfq).await.unwrap();

        let quote_v2 = spec(json!({"type": "object", "required": ["quotes"]}));
        let fuel = ExtractionAgentSpec::new(
            "fleet-ai-fuel-bid-extractor",
            "Fuel Bid",
            json!({}),
            "Extract bids.",
        );

        let report = registry.sync_all([&quote_v2, &rfq, &fuel]).await;

        assert!(report.is_clean());
        assert_eq!(
            report.outcomes,
            vec![
                ("fleet-ai-quote-extractor".to_string(), SyncOutcome::Updated),
                ("fleet-ai-rfq-extractor".to_string(), SyncOutcome::Unchanged),
                ("fleet-ai-fuel-bid-extractor".to_string(), SyncOutcome::Created),
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_all_collects_failures() {
        let service = Arc::new(MockExtractionService::new().with_lookup_failure("boom"));
        let registry = ExtractionAgentRegistry::new(service);

        let report = registry.sync_all([&spec(json!({}))]).await;
        assert!(!report.is_clean());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.failures[0].0, "fleet-ai-quote-extractor");
    }
}
