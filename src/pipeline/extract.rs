//! Text extraction: turn a document payload into one linear text string.
//!
//! Extraction is best-effort. A page that fails to load or has an unreadable
//! text layer is logged and skipped; only a container that cannot be opened
//! at all is an error. The page cap bounds latency and memory: pages past it
//! are never touched, and the caller is not told.
//!
//! Decoding is split behind [`DocumentDecoder`] so the joining policy can be
//! exercised without a pdfium library on the test machine.

use crate::error::{ExtractionError, ForgeError, PageError};
use crate::pipeline::input::ensure_pdf_magic;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-page outcome of decoding the first `max_pages` pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPages {
    /// Page count declared by the container, including pages past the cap.
    pub total_pages: usize,
    /// One entry per visited page, in page order.
    pub pages: Vec<Result<String, PageError>>,
}

/// The document-container decoding capability: bytes in, per-page text out.
pub trait DocumentDecoder: Send + Sync {
    /// Decode at most `max_pages` pages of `bytes`.
    ///
    /// Container-level failures are errors; page-level failures are reported
    /// in [`DecodedPages::pages`].
    fn decode_pages(&self, bytes: &[u8], max_pages: usize)
        -> Result<DecodedPages, ExtractionError>;
}

/// Best-effort page-text concatenation with a page cap.
#[derive(Clone)]
pub struct TextExtractor {
    decoder: Arc<dyn DocumentDecoder>,
    max_pages: usize,
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("decoder", &"<dyn DocumentDecoder>")
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl TextExtractor {
    /// Fails with [`ForgeError::InvalidConfig`] when `max_pages` is 0.
    pub fn new(decoder: Arc<dyn DocumentDecoder>, max_pages: usize) -> Result<Self, ForgeError> {
        if max_pages == 0 {
            return Err(ForgeError::InvalidConfig(
                "PDF page cap must be ≥ 1".into(),
            ));
        }
        Ok(Self { decoder, max_pages })
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Extract text from `bytes`. Blocking; CPU-bound.
    ///
    /// Successful pages are joined with `'\n'` and the result is trimmed.
    /// An empty string is a valid result.
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String, ForgeError> {
        let decoded = self.decoder.decode_pages(bytes, self.max_pages)?;
        if decoded.total_pages == 0 {
            return Err(ExtractionError::NoPages.into());
        }
        if decoded.total_pages > self.max_pages {
            debug!(
                "Page cap reached: reading {} of {} pages",
                self.max_pages, decoded.total_pages
            );
        }

        let mut texts = Vec::with_capacity(decoded.pages.len().min(self.max_pages));
        let mut skipped = 0usize;
        for page in decoded.pages.into_iter().take(self.max_pages) {
            match page {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("Skipping unreadable page: {}", e);
                    skipped += 1;
                }
            }
        }

        let text = texts.join("\n").trim().to_string();
        info!(
            "Extracted {} chars from {} pages ({} skipped)",
            text.len(),
            texts.len(),
            skipped
        );
        Ok(text)
    }

    /// [`extract_text`](Self::extract_text) on tokio's blocking pool.
    pub async fn extract_text_async(&self, bytes: Vec<u8>) -> Result<String, ForgeError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
            .await
            .map_err(|e| ForgeError::from(ExtractionError::Task(e.to_string())))?
    }
}

/// [`DocumentDecoder`] backed by the pdfium C library.
///
/// The library is bound per call, inside the blocking task, so the decoder
/// itself holds no pdfium state and is trivially `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumDecoder {
    library_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumDecoder {
    pub fn new(library_path: Option<PathBuf>, password: Option<String>) -> Self {
        Self {
            library_path,
            password,
        }
    }

    fn bind(&self) -> Result<Pdfium, ExtractionError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path.to_string_lossy().to_string()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractionError::EngineUnavailable(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl DocumentDecoder for PdfiumDecoder {
    fn decode_pages(
        &self,
        bytes: &[u8],
        max_pages: usize,
    ) -> Result<DecodedPages, ExtractionError> {
        ensure_pdf_magic(bytes)?;
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        ExtractionError::WrongPassword
                    } else {
                        ExtractionError::PasswordRequired
                    }
                } else {
                    ExtractionError::Corrupt { detail: err_str }
                }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        debug!("PDF loaded: {} pages", total_pages);

        let visit = total_pages.min(max_pages);
        let mut out = Vec::with_capacity(visit);
        for idx in 0..visit {
            let page_num = idx + 1;
            let text = pages
                .get(idx as u16)
                .map_err(|e| PageError::LoadFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })
                .and_then(|page| {
                    page.text()
                        .map(|text| text.all())
                        .map_err(|e| PageError::TextFailed {
                            page: page_num,
                            detail: format!("{:?}", e),
                        })
                });
            out.push(text);
        }

        Ok(DecodedPages {
            total_pages,
            pages: out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory document: one entry per page, `None` for a corrupt page.
    struct FakeDecoder {
        pages: Vec<Option<&'static str>>,
        visited: AtomicUsize,
    }

    impl FakeDecoder {
        fn new(pages: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                pages,
                visited: AtomicUsize::new(0),
            })
        }
    }

    impl DocumentDecoder for FakeDecoder {
        fn decode_pages(
            &self,
            _bytes: &[u8],
            max_pages: usize,
        ) -> Result<DecodedPages, ExtractionError> {
            let pages: Vec<_> = self
                .pages
                .iter()
                .take(max_pages)
                .enumerate()
                .map(|(i, p)| match p {
                    Some(text) => Ok(text.to_string()),
                    None => Err(PageError::TextFailed {
                        page: i + 1,
                        detail: "corrupt content stream".into(),
                    }),
                })
                .collect();
            self.visited.store(pages.len(), Ordering::SeqCst);
            Ok(DecodedPages {
                total_pages: self.pages.len(),
                pages,
            })
        }
    }

    struct BrokenDecoder;

    impl DocumentDecoder for BrokenDecoder {
        fn decode_pages(&self, _: &[u8], _: usize) -> Result<DecodedPages, ExtractionError> {
            Err(ExtractionError::Corrupt {
                detail: "xref table missing".into(),
            })
        }
    }

    #[test]
    fn joins_pages_with_newline_and_trims() {
        let decoder = FakeDecoder::new(vec![Some("  Page one"), Some("Page two"), Some("Page three\n\n")]);
        let text = TextExtractor::new(decoder, 500).unwrap().extract_text(b"").unwrap();
        assert_eq!(text, "Page one\nPage two\nPage three");
    }

    #[test]
    fn corrupt_tail_keeps_good_prefix_and_later_pages() {
        let decoder = FakeDecoder::new(vec![Some("a"), Some("b"), None, None, Some("e"), None]);
        let text = TextExtractor::new(decoder, 500).unwrap().extract_text(b"").unwrap();
        assert_eq!(text, "a\nb\ne");
    }

    #[test]
    fn all_pages_corrupt_is_empty_success() {
        let decoder = FakeDecoder::new(vec![None, None]);
        let text = TextExtractor::new(decoder, 500).unwrap().extract_text(b"").unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn whitespace_only_pages_are_empty_success() {
        let decoder = FakeDecoder::new(vec![Some("   "), Some("\n\t")]);
        let text = TextExtractor::new(decoder, 500).unwrap().extract_text(b"").unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn page_cap_limits_processed_pages() {
        let decoder = FakeDecoder::new(vec![Some("1"), Some("2"), Some("3"), Some("4"), Some("5")]);
        let text = TextExtractor::new(decoder.clone(), 3).unwrap().extract_text(b"").unwrap();
        assert_eq!(text, "1\n2\n3");
        assert_eq!(decoder.visited.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_page_cap_is_rejected() {
        let decoder = FakeDecoder::new(vec![Some("a")]);
        let err = TextExtractor::new(decoder, 0).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidConfig(_)));
    }

    #[test]
    fn zero_pages_is_an_extraction_error() {
        let decoder = FakeDecoder::new(vec![]);
        let err = TextExtractor::new(decoder, 500).unwrap().extract_text(b"").unwrap_err();
        assert!(matches!(err, ForgeError::Extraction(ExtractionError::NoPages)));
    }

    #[test]
    fn container_failure_propagates() {
        let err = TextExtractor::new(Arc::new(BrokenDecoder), 500)
            .unwrap()
            .extract_text(b"%PDF-1.4")
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Extraction(ExtractionError::Corrupt { .. })
        ));
    }

    #[test]
    fn pdfium_decoder_rejects_non_pdf_before_binding() {
        // The signature check runs first, so no pdfium library is needed.
        let decoder = PdfiumDecoder::new(Some("/nonexistent/libpdfium.so".into()), None);
        let err = decoder.decode_pages(b"hello world", 10).unwrap_err();
        assert!(matches!(err, ExtractionError::NotAPdf { .. }));
    }

    #[test]
    fn pdfium_decoder_reports_missing_library() {
        let decoder = PdfiumDecoder::new(Some("/nonexistent/libpdfium.so".into()), None);
        let err = decoder.decode_pages(b"%PDF-1.4\n", 10).unwrap_err();
        assert!(matches!(err, ExtractionError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn async_extraction_runs_on_blocking_pool() {
        let decoder = FakeDecoder::new(vec![Some("x"), Some("y")]);
        let text = TextExtractor::new(decoder, 500)
            .unwrap()
            .extract_text_async(b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(text, "x\ny");
    }
}
