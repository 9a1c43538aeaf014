//! Core trait abstractions.
//!
//! These are the seams where applications plug in providers, the remote
//! extraction service, upload staging and record storage.

pub mod extraction;
pub mod provider;
pub mod records;
pub mod staging;

pub use extraction::ExtractionService;
pub use provider::{ChunkStream, GenerationProvider};
pub use records::RecordSource;
pub use staging::FileStager;
