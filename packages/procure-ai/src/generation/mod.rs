//! Generation: one adapter over many providers.

pub mod adapter;
pub mod registry;
pub mod retry;

pub use adapter::{GenerationAdapter, GenerationDefaults, GenerationStream};
pub use registry::{ProviderInfo, ProviderRegistry};
pub use retry::RetryPolicy;
