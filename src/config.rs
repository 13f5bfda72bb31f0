//! Configuration types for text/PDF-to-Markdown conversion.
//!
//! All process-wide settings live in [`ForgeConfig`]: one [`ProviderConfig`]
//! per provider, the PDF page cap, and the caller-side [`InputLimits`]. The
//! config is read once at startup and shared read-only afterwards; adapters
//! copy what they need out of it at construction time.
//!
//! A provider without a credential is not an error. The config loads, the
//! adapter is built, and it simply reports itself unavailable.

use crate::error::ForgeError;
use crate::providers::ProviderKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Default PDF page cap (`PDF_MAX_PAGES`).
pub const DEFAULT_PDF_MAX_PAGES: usize = 500;
/// Default output-token budget per call (`MAX_TOKENS`).
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
/// Default per-request timeout in seconds (`REQUEST_TIMEOUT`).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Default plain-text length cap in characters (`MAX_TEXT_LENGTH`).
pub const DEFAULT_MAX_TEXT_CHARS: usize = 100_000;
/// Default document size cap in MiB (`MAX_FILE_SIZE_MB`).
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 50;

/// An API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a credential. Empty or whitespace-only strings yield `None`.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Expose the secret for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API credential. `None` marks the provider unavailable.
    pub credential: Option<ApiKey>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Output-token budget per call. Default: 4000.
    pub max_output_tokens: u32,
    /// Whole-request timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,
    /// Override for the service base URL (proxies, tests). `None` uses the
    /// provider's public endpoint.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Defaults for `kind` with no credential.
    pub fn unconfigured(kind: ProviderKind) -> Self {
        Self {
            credential: None,
            model: kind.default_model().to_string(),
            max_output_tokens: DEFAULT_MAX_TOKENS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            base_url: None,
        }
    }

    /// Defaults for `kind` with the given credential.
    pub fn with_credential(kind: ProviderKind, key: impl Into<String>) -> Self {
        Self {
            credential: ApiKey::new(key),
            ..Self::unconfigured(kind)
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Whether a credential is present.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn validate(&self, kind: ProviderKind) -> Result<(), ForgeError> {
        if self.model.trim().is_empty() {
            return Err(ForgeError::InvalidConfig(format!(
                "{kind}: model identifier must not be empty"
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ForgeError::InvalidConfig(format!(
                "{kind}: max output tokens must be ≥ 1"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ForgeError::InvalidConfig(format!(
                "{kind}: request timeout must be ≥ 1 second"
            )));
        }
        Ok(())
    }
}

/// Caller-side size limits, checked before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputLimits {
    /// Maximum plain-text length in characters. Default: 100 000.
    pub max_text_chars: usize,
    /// Maximum document size in bytes. Default: 50 MiB.
    pub max_document_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_document_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Process-wide configuration.
///
/// Built via [`ForgeConfig::from_env()`], [`ForgeConfig::builder()`] or
/// [`ForgeConfig::default()`] (every provider unconfigured).
///
/// # Example
/// ```rust
/// use markdown_forge::{ForgeConfig, ProviderConfig, ProviderKind};
///
/// let config = ForgeConfig::builder()
///     .provider(ProviderKind::OpenAi, ProviderConfig::with_credential(ProviderKind::OpenAi, "sk-test"))
///     .pdf_max_pages(50)
///     .build()
///     .unwrap();
/// assert!(config.provider(ProviderKind::OpenAi).has_credential());
/// assert!(!config.provider(ProviderKind::Claude).has_credential());
/// ```
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub claude: ProviderConfig,
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,

    /// Pages beyond this index are ignored during extraction. Default: 500.
    pub pdf_max_pages: usize,

    /// User password for encrypted PDFs.
    pub pdf_password: Option<String>,

    /// Explicit pdfium shared library. `None` binds the system library.
    pub pdfium_library_path: Option<PathBuf>,

    pub limits: InputLimits,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            claude: ProviderConfig::unconfigured(ProviderKind::Claude),
            openai: ProviderConfig::unconfigured(ProviderKind::OpenAi),
            gemini: ProviderConfig::unconfigured(ProviderKind::Gemini),
            pdf_max_pages: DEFAULT_PDF_MAX_PAGES,
            pdf_password: None,
            pdfium_library_path: None,
            limits: InputLimits::default(),
        }
    }
}

impl ForgeConfig {
    /// Create a new builder starting from [`ForgeConfig::default()`].
    pub fn builder() -> ForgeConfigBuilder {
        ForgeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ForgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Unset numeric variables fall back to their defaults; set but
    /// unparsable ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_tokens: u32 = parse_var(&lookup, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?;
        let timeout: u64 = parse_var(&lookup, "REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let provider = |kind: ProviderKind| ProviderConfig {
            credential: lookup(kind.credential_env()).and_then(ApiKey::new),
            model: lookup(kind.model_env())
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| kind.default_model().to_string()),
            max_output_tokens: max_tokens,
            request_timeout_secs: timeout,
            base_url: lookup(kind.base_url_env()).filter(|u| !u.trim().is_empty()),
        };

        let max_file_mb: usize = parse_var(&lookup, "MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB)?;

        let config = ForgeConfig {
            claude: provider(ProviderKind::Claude),
            openai: provider(ProviderKind::OpenAi),
            gemini: provider(ProviderKind::Gemini),
            pdf_max_pages: parse_var(&lookup, "PDF_MAX_PAGES", DEFAULT_PDF_MAX_PAGES)?,
            pdf_password: lookup("PDF_PASSWORD").filter(|p| !p.is_empty()),
            pdfium_library_path: lookup("PDFIUM_LIB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            limits: InputLimits {
                max_text_chars: parse_var(&lookup, "MAX_TEXT_LENGTH", DEFAULT_MAX_TEXT_CHARS)?,
                max_document_bytes: max_file_mb.saturating_mul(1024 * 1024),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Settings for one provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Claude => &self.claude,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::Claude => &mut self.claude,
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Gemini => &mut self.gemini,
        }
    }

    fn validate(&self) -> Result<(), ForgeError> {
        for kind in ProviderKind::ALL {
            self.provider(kind).validate(kind)?;
        }
        if self.pdf_max_pages == 0 {
            return Err(ForgeError::InvalidConfig(
                "PDF page cap must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ForgeError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ForgeError::InvalidConfig(format!("{key}={raw:?}: {e}"))),
    }
}

/// Builder for [`ForgeConfig`].
#[derive(Debug)]
pub struct ForgeConfigBuilder {
    config: ForgeConfig,
}

impl ForgeConfigBuilder {
    pub fn provider(mut self, kind: ProviderKind, settings: ProviderConfig) -> Self {
        *self.config.provider_mut(kind) = settings;
        self
    }

    pub fn pdf_max_pages(mut self, n: usize) -> Self {
        self.config.pdf_max_pages = n;
        self
    }

    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn limits(mut self, limits: InputLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ForgeConfig, ForgeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
