//! Provider adapters: one contract over three generative-text services.
//!
//! Each adapter wraps one external API behind [`ProviderAdapter`]. They
//! differ only in wire protocol, request shape and where the generated text
//! lives in the response. Callers see the same two operations and the same
//! two failure kinds:
//!
//! * [`ForgeError::ProviderUnconfigured`]: no credential; no I/O attempted.
//! * [`ForgeError::ProviderRequest`]: anything that went wrong once a request
//!   was attempted (transport, timeout, status, body shape, empty output).
//!
//! Adapters hold only read-only settings and a pooled HTTP client, so one
//! instance is shared behind an `Arc` by every concurrent request.
//!
//! ```text
//!              ┌──────────────────┐
//! prompt ────▶ │ ProviderAdapter  │ ───▶ generated Markdown
//!              └──────────────────┘
//!                ▲       ▲       ▲
//!      AnthropicAdapter  │   GeminiAdapter
//!                  OpenAiAdapter
//!                        │
//!                  JsonTransport (reqwest)
//! ```

pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

use crate::config::ProviderConfig;
use crate::error::ForgeError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Claude,
    /// OpenAI Chat Completions API.
    OpenAi,
    /// Google Gemini `generateContent` API.
    Gemini,
}

impl ProviderKind {
    /// Every provider, in reporting order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Claude,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Environment variable holding the credential.
    pub fn credential_env(self) -> &'static str {
        match self {
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Environment variable holding the model identifier.
    pub fn model_env(self) -> &'static str {
        match self {
            ProviderKind::Claude => "CLAUDE_MODEL",
            ProviderKind::OpenAi => "OPENAI_MODEL",
            ProviderKind::Gemini => "GEMINI_MODEL",
        }
    }

    /// Environment variable overriding the API base URL.
    pub fn base_url_env(self) -> &'static str {
        match self {
            ProviderKind::Claude => "ANTHROPIC_BASE_URL",
            ProviderKind::OpenAi => "OPENAI_BASE_URL",
            ProviderKind::Gemini => "GEMINI_BASE_URL",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude-3-sonnet-20240229",
            ProviderKind::OpenAi => "gpt-4",
            ProviderKind::Gemini => "gemini-pro",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(ForgeError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// The contract every provider adapter fulfils.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + fmt::Debug {
    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Configured model identifier.
    fn model(&self) -> &str;

    /// Configured output-token budget.
    fn max_output_tokens(&self) -> u32;

    /// `true` iff the adapter was built with a usable credential. No I/O.
    fn is_available(&self) -> bool;

    /// Send `prompt` to the service and return the primary generated text.
    ///
    /// At most one request per call; never retries.
    async fn convert(&self, prompt: &str, max_tokens: u32) -> Result<String, ForgeError>;
}

/// Availability report for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub available: bool,
    pub model: String,
}

impl ProviderStatus {
    pub fn of(adapter: &dyn ProviderAdapter) -> Self {
        Self {
            provider: adapter.kind(),
            available: adapter.is_available(),
            model: adapter.model().to_string(),
        }
    }
}

/// Build the HTTP-backed adapter for `kind` from its settings.
pub fn build_adapter(
    kind: ProviderKind,
    settings: &ProviderConfig,
) -> Result<Arc<dyn ProviderAdapter>, ForgeError> {
    let adapter: Arc<dyn ProviderAdapter> = match kind {
        ProviderKind::Claude => Arc::new(AnthropicAdapter::new(settings)?),
        ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(settings)?),
        ProviderKind::Gemini => Arc::new(GeminiAdapter::new(settings)?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        for name in ["anthropic", "google", "Claude", " openai", "GEMINI"] {
            assert!(
                matches!(name.parse::<ProviderKind>(), Err(ForgeError::UnknownProvider { .. })),
                "{name:?} should not resolve"
            );
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ForgeError::UnknownProvider { ref name } if name == "mistral"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn adapters_without_credentials_are_unavailable() {
        for kind in ProviderKind::ALL {
            let adapter = build_adapter(kind, &ProviderConfig::unconfigured(kind)).unwrap();
            assert_eq!(adapter.kind(), kind);
            assert!(!adapter.is_available());
            assert_eq!(adapter.model(), kind.default_model());
        }
    }

    #[tokio::test]
    async fn unconfigured_adapter_fails_without_network() {
        // Unroutable base URL: any connection attempt would surface as a
        // ProviderRequest error instead of ProviderUnconfigured.
        for kind in ProviderKind::ALL {
            let settings = ProviderConfig::unconfigured(kind).base_url("http://192.0.2.1:9");
            let adapter = build_adapter(kind, &settings).unwrap();
            let err = adapter.convert("prompt", 10).await.unwrap_err();
            assert!(
                matches!(err, ForgeError::ProviderUnconfigured { provider, .. } if provider == kind),
                "got: {err}"
            );
        }
    }

    #[test]
    fn status_serialises_with_lowercase_names() {
        let adapter = build_adapter(
            ProviderKind::OpenAi,
            &ProviderConfig::with_credential(ProviderKind::OpenAi, "sk-test"),
        )
        .unwrap();
        let status = ProviderStatus::of(adapter.as_ref());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["available"], true);
        assert_eq!(json["model"], "gpt-4");
    }
}
