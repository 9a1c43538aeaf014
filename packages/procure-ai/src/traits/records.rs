use async_trait::async_trait;

use crate::types::SourceRecord;

/// Loads the records to compare, e.g. every quote attached to one RFQ.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn list_records_by(&self, parent_id: &str) -> Result<Vec<SourceRecord>, Self::Error>;
}
