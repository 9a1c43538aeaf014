//! Remote extraction-agent lifecycle.

mod registry;

pub use registry::{ExtractionAgentRegistry, SyncOutcome, SyncReport};
