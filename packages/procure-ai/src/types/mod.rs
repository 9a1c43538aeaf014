//! Data types shared across the library.

pub mod agent;
pub mod comparison;
pub mod record;
pub mod request;
pub mod result;
pub mod schema;
pub mod upload;

pub use agent::{
    normalize_extension, ChunkMode, ExtractConfig, ExtractMode, ExtractTarget, ExtractionAgentSpec,
    ExtractionUsage, RemoteAgent, RemoteExtraction, DEFAULT_ALLOWED_EXTENSIONS,
    DEFAULT_ALLOWED_MIME_TYPES,
};
pub use comparison::{ComparisonResult, ItemAssessment, ScoreCard, Winner, NO_WINNER};
pub use record::{ComparableRecord, FieldValue, SourceRecord};
pub use request::{GenerationRequest, Message, ProviderRequest, Role, MAX_OUTPUT_TOKENS};
pub use result::{GenerationResult, ProviderChunk, ProviderResponse, Structured, Usage};
pub use schema::{validate_json, ResultSchema};
pub use upload::UploadedFile;
