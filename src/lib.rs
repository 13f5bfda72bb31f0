//! # markdown-forge
//!
//! Turn raw text or the text layer of a PDF into well-structured Markdown by
//! handing it to one of three generative-language providers: Claude
//! (Anthropic), OpenAI or Gemini.
//!
//! The providers are interchangeable behind [`ProviderAdapter`]; the caller
//! names one per request and gets Markdown back, or a [`ForgeError`] saying
//! which of five things went wrong.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Resolve   provider name → adapter          (UnknownProvider)
//!  ├─ 2. Extract   PDF → text via pdfium, page cap  (Extraction, EmptyDocument)
//!  ├─ 3. Prompt    text + task → instruction string
//!  └─ 4. Convert   one HTTP call, no retry          (ProviderUnconfigured, ProviderRequest)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markdown_forge::{ConversionRequest, ConversionTask, Dispatcher, ForgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from ANTHROPIC_API_KEY / OPENAI_API_KEY / GEMINI_API_KEY
//!     let config = ForgeConfig::from_env()?;
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!
//!     let request = ConversionRequest::from_text(
//!         "meeting notes\nagenda: budget, hiring",
//!         ConversionTask::ImproveStructure,
//!         "claude",
//!     );
//!     println!("{}", dispatcher.dispatch(request).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdforge` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! ## PDF support
//!
//! Text extraction binds the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` to a specific `libpdfium`, or install it system-wide.
//! Plain-text conversion never touches pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod providers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiKey, ForgeConfig, ForgeConfigBuilder, InputLimits, ProviderConfig};
pub use convert::{ConversionRequest, Dispatcher, DispatcherBuilder, SourceContent};
pub use error::{ExtractionError, ForgeError, PageError};
pub use pipeline::extract::{DecodedPages, DocumentDecoder, PdfiumDecoder, TextExtractor};
pub use prompts::{build_prompt, ConversionTask};
pub use providers::{
    AnthropicAdapter, GeminiAdapter, OpenAiAdapter, ProviderAdapter, ProviderKind, ProviderStatus,
};
