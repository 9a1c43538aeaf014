//! Concrete provider and extraction-service implementations.
//!
//! Applications can use these directly or implement the traits in
//! [`crate::traits`] themselves.

mod llama;
mod openai;

pub use llama::LlamaExtractService;
pub use openai::OpenAiProvider;
