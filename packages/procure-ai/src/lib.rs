//! Procurement Document AI Library
//!
//! Turns unstructured procurement documents (vendor quotes, RFQs, fuel
//! bids, contracts, invoices) into schema-valid records, and ranks sets of
//! records with an LLM whose output is repaired until it satisfies the
//! comparison invariants.
//!
//! # Design Philosophy
//!
//! **"Trust the schema, not the model"**
//!
//! - Every structured reply is validated against a JSON Schema
//! - Extraction agents are provisioned idempotently, by name
//! - Comparison output is repaired, never surfaced half-valid
//! - Providers stay thin wire translators; policy lives in the adapter
//!
//! # Usage
//!
//! ```rust,ignore
//! use procure_ai::{AiConfig, ComparisonEngine, DocumentExtractionPipeline, DocumentKind};
//!
//! let config = AiConfig::from_env()?;
//! let adapter = GenerationAdapter::new(Arc::new(config.openai_provider()?))
//!     .with_defaults(config.generation_defaults());
//!
//! // Extract a quote document
//! let registry = Arc::new(
//!     ExtractionAgentRegistry::new(Arc::new(config.extraction_service()?))
//!         .with_schema_sync(config.update_extractor_schema),
//! );
//! let pipeline = DocumentExtractionPipeline::new(registry);
//! let spec = DocumentKind::Quote.spec();
//! let result = pipeline.extract(&upload, &spec).await?;
//!
//! // Rank the quotes attached to an RFQ
//! let engine = ComparisonEngine::new(adapter);
//! let ranking = engine.compare(&records).await;
//! ```
//!
//! # Modules
//!
//! - [`generation`] - Provider-agnostic adapter, provider registry, retries
//! - [`agents`] - Idempotent extraction-agent lifecycle
//! - [`pipeline`] - Upload validation, staging and extraction
//! - [`comparison`] - Rubric scoring with invariant repair
//! - [`specs`] - Built-in document schemas and prompts
//! - [`ai`] - OpenAI and LlamaCloud implementations
//! - [`testing`] - Mock implementations for testing

pub mod agents;
pub mod ai;
pub mod comparison;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod security;
pub mod specs;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use agents::{ExtractionAgentRegistry, SyncOutcome, SyncReport};
pub use ai::{LlamaExtractService, OpenAiProvider};
pub use comparison::{ComparisonEngine, ComparisonProfile};
pub use config::AiConfig;
pub use context::CallContext;
pub use error::{
    AgentError, ConfigError, GenerationError, Interrupted, PipelineError, SanitizeError,
};
pub use generation::{
    GenerationAdapter, GenerationDefaults, GenerationStream, ProviderInfo, ProviderRegistry,
    RetryPolicy,
};
pub use pipeline::{DocumentExtractionPipeline, ExtractionResult, TempFileStager, TypedExtraction};
pub use security::SecretString;
pub use specs::{DocumentKind, DocumentSpecRegistry};
pub use traits::{ExtractionService, FileStager, GenerationProvider, RecordSource};
pub use types::{
    ComparisonResult, ExtractionAgentSpec, FieldValue, GenerationRequest, GenerationResult,
    Message, ResultSchema, Role, SourceRecord, Structured, UploadedFile, Usage,
};
