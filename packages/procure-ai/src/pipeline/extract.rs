//! Upload to validated JSON in one call.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::agents::ExtractionAgentRegistry;
use crate::context::CallContext;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::staging::TempFileStager;
use crate::pipeline::validate::validate_upload;
use crate::traits::FileStager;
use crate::types::{
    validate_json, ExtractionAgentSpec, ExtractionUsage, RemoteExtraction, UploadedFile,
};

/// Schema-valid payload from one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Agent that produced the payload
    pub agent: String,
    pub data: Value,
    pub usage: ExtractionUsage,
}

/// A typed extraction.
#[derive(Debug, Clone)]
pub struct TypedExtraction<T> {
    pub agent: String,
    pub document: T,
    pub usage: ExtractionUsage,
}

/// Validate, stage, resolve the agent, extract, check the schema.
///
/// Nothing touches the network before the file passes validation, and the
/// staged copy is removed on every exit path.
pub struct DocumentExtractionPipeline {
    registry: Arc<ExtractionAgentRegistry>,
    stager: Arc<dyn FileStager>,
}

impl DocumentExtractionPipeline {
    pub fn new(registry: Arc<ExtractionAgentRegistry>) -> Self {
        Self {
            registry,
            stager: Arc::new(TempFileStager::new()),
        }
    }

    pub fn with_stager(mut self, stager: Arc<dyn FileStager>) -> Self {
        self.stager = stager;
        self
    }

    pub fn registry(&self) -> &Arc<ExtractionAgentRegistry> {
        &self.registry
    }

    pub async fn extract(
        &self,
        file: &UploadedFile,
        spec: &ExtractionAgentSpec,
    ) -> PipelineResult<ExtractionResult> {
        self.extract_with(file, spec, &CallContext::default()).await
    }

    /// [`extract`](Self::extract) under a cancellation token and deadline.
    pub async fn extract_with(
        &self,
        file: &UploadedFile,
        spec: &ExtractionAgentSpec,
        ctx: &CallContext,
    ) -> PipelineResult<ExtractionResult> {
        let started = Instant::now();
        let outcome = self.run(file, spec, ctx).await;

        match &outcome {
            Ok(result) => info!(
                label = %spec.label,
                agent = %result.agent,
                pages = result.usage.pages,
                duration_ms = started.elapsed().as_millis() as u64,
                "Extraction completed"
            ),
            Err(e) => error!(
                label = %spec.label,
                agent = %spec.name,
                filename = %file.filename,
                error = %e,
                "Extraction failed"
            ),
        }

        outcome
    }

    /// Extract and deserialize into a document type.
    pub async fn extract_as<T: DeserializeOwned>(
        &self,
        file: &UploadedFile,
        spec: &ExtractionAgentSpec,
    ) -> PipelineResult<TypedExtraction<T>> {
        let result = self.extract(file, spec).await?;
        let document = serde_json::from_value(result.data).map_err(|e| {
            error!(label = %spec.label, error = %e, "Extracted payload does not fit document type");
            PipelineError::SchemaMismatch {
                reason: e.to_string(),
            }
        })?;
        Ok(TypedExtraction {
            agent: result.agent,
            document,
            usage: result.usage,
        })
    }

    async fn run(
        &self,
        file: &UploadedFile,
        spec: &ExtractionAgentSpec,
        ctx: &CallContext,
    ) -> PipelineResult<ExtractionResult> {
        validate_upload(file, spec)?;

        let mut staged = ctx.guard(self.stager.stage(file)).await??;
        info!(label = %spec.label, "Upload staged");

        let remote = self.resolve_and_extract(spec, staged.path(), ctx).await;
        staged.release();
        let remote = remote?;

        validate_json(&spec.schema, &remote.data)
            .map_err(|reason| PipelineError::SchemaMismatch { reason })?;

        Ok(ExtractionResult {
            agent: spec.name.clone(),
            data: remote.data,
            usage: remote.usage,
        })
    }

    async fn resolve_and_extract(
        &self,
        spec: &ExtractionAgentSpec,
        path: &Path,
        ctx: &CallContext,
    ) -> PipelineResult<RemoteExtraction> {
        let agent = ctx
            .guard(self.registry.ensure(spec))
            .await?
            .map_err(|source| PipelineError::AgentResolution {
                agent: spec.name.clone(),
                source,
            })?;

        info!(agent = %agent.name, agent_id = %agent.id, "Starting remote extraction");
        ctx.guard(self.registry.service().extract(&agent, path))
            .await?
            .map_err(|e| PipelineError::RemoteExtraction(Box::new(e)))
    }
}
