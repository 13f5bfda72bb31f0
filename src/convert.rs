//! Conversion dispatch: the single operational entry point.
//!
//! A [`Dispatcher`] owns one adapter per provider and a [`TextExtractor`].
//! Each [`Dispatcher::dispatch`] call is one linear pass:
//!
//! ```text
//! resolve provider ──▶ extract (PDF only) ──▶ build prompt ──▶ adapter.convert
//!   UnknownProvider     Extraction /                          ProviderUnconfigured /
//!                       EmptyDocument                         ProviderRequest
//! ```
//!
//! The provider is resolved first so a bad name fails before any document
//! work, and extraction precedes the call so an empty document never reaches
//! a provider. Errors propagate unchanged; nothing is retried.

use crate::config::{ForgeConfig, InputLimits};
use crate::error::ForgeError;
use crate::pipeline::extract::{DocumentDecoder, PdfiumDecoder, TextExtractor};
use crate::prompts::{build_prompt, ConversionTask};
use crate::providers::{build_adapter, ProviderAdapter, ProviderKind, ProviderStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The payload of a request: raw text, or a document to extract text from.
#[derive(Clone, PartialEq, Eq)]
pub enum SourceContent {
    PlainText(String),
    PdfDocument(Vec<u8>),
}

impl SourceContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceContent::PlainText(_) => "text",
            SourceContent::PdfDocument(_) => "pdf",
        }
    }
}

impl fmt::Debug for SourceContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceContent::PlainText(text) => write!(f, "PlainText({} chars)", text.chars().count()),
            SourceContent::PdfDocument(bytes) => write!(f, "PdfDocument({} bytes)", bytes.len()),
        }
    }
}

/// One conversion request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    content: SourceContent,
    task: ConversionTask,
    provider: String,
}

impl ConversionRequest {
    pub fn new(content: SourceContent, task: ConversionTask, provider: impl Into<String>) -> Self {
        Self {
            content,
            task,
            provider: provider.into(),
        }
    }

    pub fn from_text(text: impl Into<String>, task: ConversionTask, provider: impl Into<String>) -> Self {
        Self::new(SourceContent::PlainText(text.into()), task, provider)
    }

    pub fn from_pdf(bytes: impl Into<Vec<u8>>, task: ConversionTask, provider: impl Into<String>) -> Self {
        Self::new(SourceContent::PdfDocument(bytes.into()), task, provider)
    }

    pub fn content(&self) -> &SourceContent {
        &self.content
    }

    pub fn task(&self) -> &ConversionTask {
        &self.task
    }

    /// The provider name as given; resolved at dispatch time.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Check caller-side size limits. The dispatcher itself never truncates
    /// or rejects on size.
    pub fn check_limits(&self, limits: &InputLimits) -> Result<(), ForgeError> {
        match &self.content {
            SourceContent::PlainText(text) => {
                let chars = text.chars().count();
                if chars > limits.max_text_chars {
                    return Err(ForgeError::InputTooLarge {
                        what: "text",
                        limit: limits.max_text_chars,
                        actual: chars,
                    });
                }
            }
            SourceContent::PdfDocument(bytes) => {
                if bytes.len() > limits.max_document_bytes {
                    return Err(ForgeError::InputTooLarge {
                        what: "document",
                        limit: limits.max_document_bytes,
                        actual: bytes.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Routes requests to provider adapters.
///
/// Cheap to share: wrap in an `Arc` and call [`dispatch`](Self::dispatch)
/// from as many tasks as needed. Adapters are built once, here.
pub struct Dispatcher {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
    extractor: TextExtractor,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.provider_statuses())
            .field("extractor", &self.extractor)
            .finish()
    }
}

impl Dispatcher {
    /// Build every adapter from `config`, plus a pdfium-backed extractor.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, ForgeError> {
        let mut builder = Self::builder()
            .max_pages(config.pdf_max_pages)
            .decoder(Arc::new(PdfiumDecoder::new(
                config.pdfium_library_path.clone(),
                config.pdf_password.clone(),
            )));
        for kind in ProviderKind::ALL {
            builder = builder.adapter(build_adapter(kind, config.provider(kind))?);
        }
        let dispatcher = builder.build()?;

        for status in dispatcher.provider_statuses() {
            if status.available {
                info!("{} configured with model {}", status.provider, status.model);
            } else {
                debug!("{} not configured", status.provider);
            }
        }
        Ok(dispatcher)
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Convert one request end to end.
    pub async fn dispatch(&self, request: ConversionRequest) -> Result<String, ForgeError> {
        let start = Instant::now();
        let ConversionRequest {
            content,
            task,
            provider,
        } = request;

        let kind: ProviderKind = provider.parse()?;
        let adapter = self.adapter(kind)?;
        info!(
            "Dispatching {} conversion to {} (task: {})",
            content.kind_name(),
            kind,
            task
        );

        let text = match content {
            SourceContent::PlainText(text) => text,
            SourceContent::PdfDocument(bytes) => {
                let text = self.extractor.extract_text_async(bytes).await?;
                if text.trim().is_empty() {
                    return Err(ForgeError::EmptyDocument);
                }
                text
            }
        };

        let prompt = build_prompt(&text, &task);
        debug!("Prompt built: {} chars", prompt.len());

        match adapter.convert(&prompt, adapter.max_output_tokens()).await {
            Ok(markdown) => {
                info!(
                    "Conversion via {} complete: {} chars in {}ms",
                    kind,
                    markdown.len(),
                    start.elapsed().as_millis()
                );
                Ok(markdown)
            }
            Err(e) => {
                warn!("Conversion via {} failed: {}", kind, e);
                Err(e)
            }
        }
    }

    /// The adapter registered for `kind`.
    pub fn adapter(&self, kind: ProviderKind) -> Result<&Arc<dyn ProviderAdapter>, ForgeError> {
        self.adapters
            .get(&kind)
            .ok_or_else(|| ForgeError::unconfigured(kind))
    }

    /// Whether `kind` has a usable credential. Never performs I/O.
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.adapters
            .get(&kind)
            .map(|a| a.is_available())
            .unwrap_or(false)
    }

    /// Availability and model of every known provider, in reporting order.
    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        ProviderKind::ALL
            .iter()
            .map(|&kind| match self.adapters.get(&kind) {
                Some(adapter) => ProviderStatus::of(adapter.as_ref()),
                None => ProviderStatus {
                    provider: kind,
                    available: false,
                    model: kind.default_model().to_string(),
                },
            })
            .collect()
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }
}

/// Builder for [`Dispatcher`]. Used directly to inject custom adapters or a
/// custom document decoder.
pub struct DispatcherBuilder {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
    decoder: Option<Arc<dyn DocumentDecoder>>,
    max_pages: usize,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            adapters: HashMap::new(),
            decoder: None,
            max_pages: crate::config::DEFAULT_PDF_MAX_PAGES,
        }
    }
}

impl DispatcherBuilder {
    /// Register `adapter` under its own [`ProviderAdapter::kind`], replacing
    /// any previous one.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn DocumentDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.max_pages = n;
        self
    }

    /// Finish. Providers without a registered adapter report unavailable and
    /// fail dispatch with [`ForgeError::ProviderUnconfigured`]. A page cap of
    /// 0 is rejected with [`ForgeError::InvalidConfig`].
    pub fn build(self) -> Result<Dispatcher, ForgeError> {
        let decoder = self
            .decoder
            .unwrap_or_else(|| Arc::new(PdfiumDecoder::default()));
        Ok(Dispatcher {
            adapters: self.adapters,
            extractor: TextExtractor::new(decoder, self.max_pages)?,
        })
    }
}
