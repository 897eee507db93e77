// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Parity
//!
//! Visual regression scoring for PDF renderings: compare a candidate PDF
//! against a reference PDF page by page and get a reproducible score, a grade
//! and diff images.
//!
//! ## Core Features
//!
//! - **Structural similarity**: windowed SSIM on unweighted-mean grayscale,
//!   with the full per-pixel similarity map
//! - **Page alignment**: pages paired by index, extra or missing pages marked
//!   and penalised (up to 30%)
//! - **Grading**: fixed A–F thresholds on the penalised score
//! - **Reports**: `comparison-results.json`, `VISUAL-QUALITY-REPORT.md` and
//!   `diffs/*.png` for pages under 0.8
//! - **Batch runs**: recursive discovery, missing candidates recorded, a
//!   bounded worker pool, deltas against a previous run
//!
//! ## Architecture
//!
//! Rendering is delegated to a [`Rasterizer`](rasterizer::Rasterizer); the
//! bundled implementation drives poppler's `pdftoppm`. Every per-document
//! failure becomes a [`DocumentResult`] with an `error` status, so a batch of
//! N documents always produces N records.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_parity::rasterizer::PdftoppmRasterizer;
//! use pdf_parity::document::DocumentScorer;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rasterizer = PdftoppmRasterizer::new();
//! rasterizer.check_available()?;
//!
//! let scorer = DocumentScorer::new(&rasterizer, 150).with_diff_dir("diffs");
//! let result = scorer.compare(Path::new("reference/a.pdf"), Path::new("candidate/a.pdf"));
//! println!("{}: {} ({:.4})", result.name(), result.grade(), result.avg_ssim());
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Page rendering boundary
pub mod rasterizer;

// Scoring
pub mod comparator;
pub mod document;
pub mod grade;
pub mod ssim;

// Reporting
pub mod baseline;
pub mod report;

// Batch orchestration
pub mod batch;

// Re-exports
pub use comparator::{compare_pages, PageComparison};
pub use config::CompareConfig;
pub use document::{
    compare_documents, DocumentResult, DocumentScorer, DocumentStatus, PageNote, PageResult,
};
pub use error::{Error, Result};
pub use grade::Grade;
pub use rasterizer::{PageImage, PdftoppmRasterizer, Rasterizer};
pub use report::{build_markdown_report, build_summary, ComparisonSummary};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting operations never panic due to NaN comparisons.
    #[inline]
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

    /// Round a score to four decimal places, the precision of stored results.
    #[inline]
    pub fn round_score(value: f64) -> f64 {
        (value * 10_000.0).round() / 10_000.0
    }

    /// First `max` characters of `text` (not bytes).
    pub fn truncate_chars(text: &str, max: usize) -> &str {
        match text.char_indices().nth(max) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_parity");
    }
}
