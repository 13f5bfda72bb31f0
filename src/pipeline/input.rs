//! Input validation: cheap checks on a payload before anything heavier runs.
//!
//! pdfium reports a non-PDF payload as a generic load failure. Checking the
//! `%PDF` signature first gives callers a precise error and skips binding the
//! library for obviously wrong uploads.

use crate::error::ExtractionError;
use std::path::Path;
use tracing::debug;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Reject payloads that do not start with the PDF signature.
pub fn ensure_pdf_magic(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() >= PDF_MAGIC.len() && &bytes[..PDF_MAGIC.len()] == PDF_MAGIC {
        debug!("PDF signature ok ({} bytes)", bytes.len());
        return Ok(());
    }
    Err(ExtractionError::NotAPdf {
        magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
    })
}

/// Whether `path` names a PDF by extension (case-insensitive).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
