use async_trait::async_trait;

use crate::pipeline::StagedFile;
use crate::types::UploadedFile;

/// Writes an upload somewhere the extraction service client can read it.
///
/// The returned [`StagedFile`] owns the location and releases it when
/// dropped.
#[async_trait]
pub trait FileStager: Send + Sync {
    async fn stage(&self, file: &UploadedFile) -> std::io::Result<StagedFile>;
}
