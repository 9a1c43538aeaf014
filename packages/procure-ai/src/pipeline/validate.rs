//! Upload checks against an extraction spec's allow-lists.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ExtractionAgentSpec, UploadedFile};

/// Check an upload's extension and declared MIME type against the spec.
///
/// Both must be on the allow-lists. Comparison ignores case and any MIME
/// parameters (`; charset=...`).
pub fn validate_upload(file: &UploadedFile, spec: &ExtractionAgentSpec) -> PipelineResult<()> {
    let unsupported = |reason: String| PipelineError::UnsupportedFile {
        filename: file.filename.clone(),
        reason,
    };

    let extension = file
        .extension()
        .ok_or_else(|| unsupported("file has no extension".to_string()))?;
    if !spec.allowed_extensions.iter().any(|e| *e == extension) {
        return Err(unsupported(format!(
            "extension {extension} is not one of {}",
            spec.allowed_extensions.join(", ")
        )));
    }

    let mime = file
        .content_type
        .as_deref()
        .map(|m| m.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| unsupported("content type is missing".to_string()))?;
    if !spec.allowed_mime_types.iter().any(|m| *m == mime) {
        return Err(unsupported(format!("content type {mime} is not allowed")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    fn spec() -> ExtractionAgentSpec {
        ExtractionAgentSpec::new("agent", "Quote", json!({}), "")
    }

    #[test]
    fn test_accepts_pdf_and_docx_any_case() {
        let pdf = UploadedFile::new("Q-77.PDF", Some("Application/PDF"), b"%PDF".to_vec());
        assert!(validate_upload(&pdf, &spec()).is_ok());

        let docx = UploadedFile::new("rfq.docx", Some(DOCX), Vec::new());
        assert!(validate_upload(&docx, &spec()).is_ok());

        let with_params =
            UploadedFile::new("a.pdf", Some("application/pdf; charset=binary"), Vec::new());
        assert!(validate_upload(&with_params, &spec()).is_ok());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let file = UploadedFile::new("data.csv", Some("application/pdf"), Vec::new());
        let err = validate_upload(&file, &spec()).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFile { .. }));
    }

    #[test]
    fn test_rejects_mismatched_mime_even_with_good_extension() {
        let file = UploadedFile::new("quote.pdf", Some("text/plain"), Vec::new());
        assert!(validate_upload(&file, &spec()).is_err());

        let missing = UploadedFile::new("quote.pdf", None::<String>, Vec::new());
        assert!(validate_upload(&missing, &spec()).is_err());
    }

    #[test]
    fn test_custom_allow_list() {
        let spec = spec().with_allowed_types(["PDF"], ["application/pdf"]);
        let docx = UploadedFile::new("rfq.docx", Some(DOCX), Vec::new());
        assert!(validate_upload(&docx, &spec).is_err());
    }
}
