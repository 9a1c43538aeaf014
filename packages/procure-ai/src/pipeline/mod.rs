//! Document extraction pipeline.
//!
//! ```text
//! UploadedFile ─► validate ─► stage ─► ensure agent ─► remote extract ─► schema check
//! ```

mod extract;
mod staging;
mod validate;

pub use extract::{DocumentExtractionPipeline, ExtractionResult, TypedExtraction};
pub use staging::{StagedFile, TempFileStager};
pub use validate::validate_upload;
