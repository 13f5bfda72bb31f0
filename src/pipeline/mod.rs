//! Pre-provider stages of a conversion.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ input ──▶ extract ──▶ (prompt builder) ──▶ provider
//!          (%PDF)    (pdfium)
//! ```
//!
//! 1. [`input`]: cheap payload checks (PDF signature, file extension)
//! 2. [`extract`]: best-effort page-text concatenation under a page cap;
//!    runs in `spawn_blocking` because pdfium is CPU-bound and not async-safe
//!
//! Plain-text requests skip both stages.

pub mod extract;
pub mod input;
