//! Generation provider trait.
//!
//! A provider turns a fully resolved [`ProviderRequest`] into text. Request
//! normalization, schema validation, retries and stream accumulation all
//! live in the adapter, so implementations stay thin wire translators.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{ProviderChunk, ProviderRequest, ProviderResponse};

/// Stream of raw deltas from a provider.
pub type ChunkStream = BoxStream<'static, Result<ProviderChunk>>;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stable name used in the registry and in error messages.
    fn name(&self) -> &str;

    /// One-shot completion.
    ///
    /// When `request.schema` is set the provider must ask for constrained
    /// JSON output in whatever way it supports.
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Streaming completion, deltas in delivery order.
    ///
    /// The terminal usage figures, if the provider reports them, arrive on
    /// one of the last chunks.
    async fn stream(&self, request: &ProviderRequest) -> Result<ChunkStream>;

    /// Cheap reachability probe used when the registry initializes.
    async fn health_check(&self) -> bool {
        true
    }
}
