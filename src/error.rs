//! Error types for the markdown-forge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ForgeError`]: **request-scoped**. The conversion cannot produce a
//!   result (unparsable document, unknown provider, missing credential,
//!   failed provider call). Returned as `Err(ForgeError)` from
//!   [`crate::convert::Dispatcher::dispatch`]. Shared state is never touched,
//!   so the next request is unaffected.
//!
//! * [`PageError`]: **non-fatal**. A single page of a document could not be
//!   read. The extractor logs it and carries on with the remaining pages.
//!
//! Extraction failures of the container itself are grouped under
//! [`ExtractionError`] so callers can match on one variant for "the document
//! could not be opened" without caring about the precise reason.

use crate::providers::ProviderKind;
use thiserror::Error;

/// All request-level errors returned by the markdown-forge library.
#[derive(Debug, Error)]
pub enum ForgeError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The document container could not be opened or parsed.
    #[error("PDF extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The document was parsed but no page yielded any text.
    #[error("No text could be extracted from the PDF (empty or image-only document)")]
    EmptyDocument,

    // ── Provider errors ───────────────────────────────────────────────────
    /// The requested provider name is not one of the known providers.
    #[error("Unknown provider '{name}'. Expected one of: claude, openai, gemini")]
    UnknownProvider { name: String },

    /// The provider is known but was configured without a credential.
    #[error("Provider '{provider}' is not configured.\n{hint}")]
    ProviderUnconfigured { provider: ProviderKind, hint: String },

    /// A credentialed provider call failed: transport error, timeout,
    /// non-2xx status, malformed body or an empty generation.
    #[error("{provider} request failed (model {model}): {cause}")]
    ProviderRequest {
        provider: ProviderKind,
        model: String,
        cause: String,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller-side input limits were exceeded.
    #[error("{what} too large: {actual} exceeds the limit of {limit}")]
    InputTooLarge {
        what: &'static str,
        limit: usize,
        actual: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForgeError {
    pub(crate) fn unconfigured(provider: ProviderKind) -> Self {
        ForgeError::ProviderUnconfigured {
            provider,
            hint: format!("Set {} to enable it.", provider.credential_env()),
        }
    }

    pub(crate) fn request(
        provider: ProviderKind,
        model: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        ForgeError::ProviderRequest {
            provider,
            model: model.into(),
            cause: cause.into(),
        }
    }
}

/// Reasons a document container could not be opened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The payload does not start with the `%PDF` signature.
    #[error("payload is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// Header, trailer or xref table is corrupt.
    #[error("PDF is corrupt: {detail}")]
    Corrupt { detail: String },

    /// The document is encrypted and no password was configured.
    #[error("PDF is encrypted and requires a password (set PDF_PASSWORD)")]
    PasswordRequired,

    /// A password was configured but the document rejected it.
    #[error("wrong password for encrypted PDF")]
    WrongPassword,

    /// The container opened but declares no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The pdfium library could not be loaded.
    #[error(
        "failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    /// The decoding task itself failed (panic or join error).
    #[error("decoder task failed: {0}")]
    Task(String),
}

/// A non-fatal error for a single page of a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The page object could not be loaded.
    #[error("Page {page}: could not be loaded: {detail}")]
    LoadFailed { page: usize, detail: String },

    /// The page loaded but its text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextFailed { page: usize, detail: String },
}
