//! Document-level alignment and scoring.
//!
//! A reference and a candidate PDF are rasterized, pages are paired by index,
//! and pages present on only one side are recorded as unmatched. The document
//! score is the mean SSIM over matched pages minus a pagination penalty of
//! up to 30%, so a candidate that drops or adds pages cannot score as well as
//! one that reproduces every page.
//!
//! Failures never leave this module as errors: every comparison ends in a
//! [`DocumentResult`], with [`DocumentStatus::Error`] carrying the message
//! when rasterization or diff output failed.

use crate::comparator::compare_pages;
use crate::error::Result;
use crate::grade::Grade;
use crate::rasterizer::Rasterizer;
use crate::ssim::SimilarityMap;
use crate::utils::round_score;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Pages scoring below this SSIM get a diff image.
pub const DIFF_THRESHOLD: f64 = 0.8;

/// Largest share of the score removed for unmatched pages.
pub const PAGINATION_PENALTY_CAP: f64 = 0.30;

/// Why a page has no counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageNote {
    /// The candidate has more pages than the reference.
    MissingInReference,
    /// The reference has more pages than the candidate.
    MissingInTest,
}

/// Score of a single page position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(rename = "page")]
    page_index: usize,
    ssim: f64,
    size_match: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<PageNote>,
}

impl PageResult {
    /// Page present on both sides. Scores are stored to four decimals.
    pub fn matched(page_index: usize, ssim: f64, size_match: f64) -> Self {
        Self {
            page_index,
            ssim: round_score(ssim),
            size_match: round_score(size_match),
            note: None,
        }
    }

    /// Page present on one side only; scores zero.
    pub fn unmatched(page_index: usize, note: PageNote) -> Self {
        Self {
            page_index,
            ssim: 0.0,
            size_match: 0.0,
            note: Some(note),
        }
    }

    /// 1-based page number.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// SSIM, `0.0` for unmatched pages.
    pub fn ssim(&self) -> f64 {
        self.ssim
    }

    /// Page-area agreement, `0.0` for unmatched pages.
    pub fn size_match(&self) -> f64 {
        self.size_match
    }

    /// Set for unmatched pages.
    pub fn note(&self) -> Option<PageNote> {
        self.note
    }

    /// True when both documents have this page.
    pub fn is_matched(&self) -> bool {
        self.note.is_none()
    }
}

/// Terminal state of a document comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Both documents rasterized and scored
    Compared,
    /// No candidate file at the expected path
    Missing,
    /// Reference rendered zero pages
    RefEmpty,
    /// Candidate rendered zero pages
    TestEmpty,
    /// Rasterization or scoring failed
    Error,
}

impl DocumentStatus {
    /// Name as written in the JSON summary.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Compared => "compared",
            DocumentStatus::Missing => "missing",
            DocumentStatus::RefEmpty => "ref_empty",
            DocumentStatus::TestEmpty => "test_empty",
            DocumentStatus::Error => "error",
        }
    }
}

/// Unrounded aggregate over a page list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAggregate {
    /// Mean SSIM over matched pages, `None` when nothing matched.
    pub matched_avg: Option<f64>,
    /// Matched pages over all page positions.
    pub match_ratio: f64,
    /// Amount subtracted from `matched_avg`.
    pub penalty: f64,
    /// `matched_avg - penalty`, or `0.0` when nothing matched.
    pub avg_ssim: f64,
    /// Lowest SSIM over all pages, unmatched ones included.
    pub min_ssim: f64,
}

/// `min(0.30, (1 - matched / total) * 0.30)`; zero for an empty document.
pub fn pagination_penalty(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = matched as f64 / total as f64;
    PAGINATION_PENALTY_CAP.min((1.0 - ratio) * PAGINATION_PENALTY_CAP)
}

/// Aggregate page results into a document score.
pub fn aggregate_scores(pages: &[PageResult]) -> ScoreAggregate {
    let matched: Vec<f64> = pages.iter().filter(|p| p.is_matched()).map(|p| p.ssim).collect();
    let min_ssim = pages.iter().map(|p| p.ssim).reduce(f64::min).unwrap_or(0.0);

    if matched.is_empty() {
        // Unreachable through DocumentScorer, whose empty-document checks
        // guarantee at least one matched page.
        return ScoreAggregate {
            matched_avg: None,
            match_ratio: 0.0,
            penalty: 0.0,
            avg_ssim: 0.0,
            min_ssim,
        };
    }

    let matched_avg = matched.iter().sum::<f64>() / matched.len() as f64;
    let match_ratio = matched.len() as f64 / pages.len() as f64;
    let penalty = pagination_penalty(matched.len(), pages.len());

    ScoreAggregate {
        matched_avg: Some(matched_avg),
        match_ratio,
        penalty,
        avg_ssim: matched_avg - penalty,
        min_ssim,
    }
}

/// Outcome of comparing one reference document with its candidate.
///
/// Instances are built only through the status constructors, which derive
/// the grade from the average score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    #[serde(rename = "reference")]
    reference_path: PathBuf,
    #[serde(rename = "test", default)]
    test_path: PathBuf,
    status: DocumentStatus,
    #[serde(rename = "ref_pages", default)]
    ref_page_count: Option<usize>,
    #[serde(rename = "test_pages", default)]
    test_page_count: Option<usize>,
    #[serde(default)]
    pages: Vec<PageResult>,
    avg_ssim: f64,
    #[serde(default)]
    min_ssim: f64,
    grade: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DocumentResult {
    /// Both documents scored. `pages` must hold one entry per page position.
    pub fn compared(
        reference_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        ref_page_count: usize,
        test_page_count: usize,
        pages: Vec<PageResult>,
    ) -> Self {
        debug_assert_eq!(pages.len(), ref_page_count.max(test_page_count));
        let aggregate = aggregate_scores(&pages);
        let avg_ssim = round_score(aggregate.avg_ssim);
        Self {
            reference_path: reference_path.into(),
            test_path: test_path.into(),
            status: DocumentStatus::Compared,
            ref_page_count: Some(ref_page_count),
            test_page_count: Some(test_page_count),
            pages,
            avg_ssim,
            min_ssim: round_score(aggregate.min_ssim),
            grade: Grade::from_score(avg_ssim),
            error: None,
        }
    }

    /// Candidate file absent; nothing was rasterized.
    pub fn missing(reference_path: impl Into<PathBuf>, test_path: impl Into<PathBuf>) -> Self {
        Self::unscored(reference_path, test_path, DocumentStatus::Missing, None, None, None)
    }

    /// Reference rendered no pages.
    pub fn ref_empty(
        reference_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        test_page_count: usize,
    ) -> Self {
        Self::unscored(
            reference_path,
            test_path,
            DocumentStatus::RefEmpty,
            Some(0),
            Some(test_page_count),
            None,
        )
    }

    /// Candidate rendered no pages.
    pub fn test_empty(
        reference_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        ref_page_count: usize,
    ) -> Self {
        Self::unscored(
            reference_path,
            test_path,
            DocumentStatus::TestEmpty,
            Some(ref_page_count),
            Some(0),
            None,
        )
    }

    /// Rasterization or scoring failed with `message`.
    pub fn failed(
        reference_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::unscored(
            reference_path,
            test_path,
            DocumentStatus::Error,
            None,
            None,
            Some(message.into()),
        )
    }

    fn unscored(
        reference_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        status: DocumentStatus,
        ref_page_count: Option<usize>,
        test_page_count: Option<usize>,
        error: Option<String>,
    ) -> Self {
        Self {
            reference_path: reference_path.into(),
            test_path: test_path.into(),
            status,
            ref_page_count,
            test_page_count,
            pages: Vec::new(),
            avg_ssim: 0.0,
            min_ssim: 0.0,
            grade: Grade::F,
            error,
        }
    }

    /// Replace the recorded reference path, e.g. with one relative to the
    /// reference root so runs over different checkouts stay comparable.
    pub(crate) fn with_reference_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_path = path.into();
        self
    }

    /// Reference PDF as recorded.
    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    /// Candidate PDF path. Empty for missing records loaded from older runs.
    pub fn test_path(&self) -> &Path {
        &self.test_path
    }

    /// Terminal state.
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Reference page count, if rasterized.
    pub fn ref_page_count(&self) -> Option<usize> {
        self.ref_page_count
    }

    /// Candidate page count, if rasterized.
    pub fn test_page_count(&self) -> Option<usize> {
        self.test_page_count
    }

    /// Per-position page results.
    pub fn pages(&self) -> &[PageResult] {
        &self.pages
    }

    /// Penalised document score.
    pub fn avg_ssim(&self) -> f64 {
        self.avg_ssim
    }

    /// Lowest page score.
    pub fn min_ssim(&self) -> f64 {
        self.min_ssim
    }

    /// Grade derived from [`avg_ssim`](Self::avg_ssim).
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Failure message for [`DocumentStatus::Error`].
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Reference file name without extension, used for display and diff names.
    pub fn name(&self) -> String {
        self.reference_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// Scores document pairs with a shared rasterizer.
pub struct DocumentScorer<'a> {
    rasterizer: &'a dyn Rasterizer,
    dpi: u32,
    diff_dir: Option<PathBuf>,
}

impl<'a> DocumentScorer<'a> {
    /// Scorer rendering at `dpi`, without diff output.
    pub fn new(rasterizer: &'a dyn Rasterizer, dpi: u32) -> Self {
        Self {
            rasterizer,
            dpi,
            diff_dir: None,
        }
    }

    /// Write diff images for pages below [`DIFF_THRESHOLD`] into `dir`.
    pub fn with_diff_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diff_dir = Some(dir.into());
        self
    }

    /// Rasterization DPI.
    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Compare `reference` against `candidate`. Never fails; errors are
    /// recorded in the result.
    pub fn compare(&self, reference: &Path, candidate: &Path) -> DocumentResult {
        match self.try_compare(reference, candidate) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Comparison of {} failed: {}", reference.display(), e);
                DocumentResult::failed(reference, candidate, e.to_string())
            },
        }
    }

    fn try_compare(&self, reference: &Path, candidate: &Path) -> Result<DocumentResult> {
        let ref_pages = self.rasterizer.rasterize(reference, self.dpi)?;
        let test_pages = self.rasterizer.rasterize(candidate, self.dpi)?;
        let ref_count = ref_pages.len();
        let test_count = test_pages.len();

        if ref_count == 0 {
            return Ok(DocumentResult::ref_empty(reference, candidate, test_count));
        }
        if test_count == 0 {
            return Ok(DocumentResult::test_empty(reference, candidate, ref_count));
        }

        let min_n = ref_count.min(test_count);
        let max_n = ref_count.max(test_count);
        let mut pages = Vec::with_capacity(max_n);

        // Consume the page images so each pair is released once scored.
        for (i, (ref_page, test_page)) in ref_pages.into_iter().zip(test_pages).enumerate() {
            let comparison = compare_pages(&ref_page, &test_page);
            let page = PageResult::matched(i + 1, comparison.ssim, comparison.size_match);
            log::debug!(
                "{} page {}: ssim={:.4} size_match={:.4}",
                reference.display(),
                i + 1,
                page.ssim(),
                page.size_match()
            );

            if page.ssim() < DIFF_THRESHOLD {
                if let Some(dir) = &self.diff_dir {
                    write_diff_image(dir, reference, i + 1, &comparison.diff_map)?;
                }
            }
            pages.push(page);
        }

        for i in min_n..max_n {
            let note = if i >= test_count {
                PageNote::MissingInTest
            } else {
                PageNote::MissingInReference
            };
            pages.push(PageResult::unmatched(i + 1, note));
        }

        let result = DocumentResult::compared(reference, candidate, ref_count, test_count, pages);
        log::info!(
            "{}: grade {} (avg {:.4}, {}/{} pages)",
            reference.display(),
            result.grade(),
            result.avg_ssim(),
            ref_count,
            test_count
        );
        Ok(result)
    }
}

/// Compare two PDFs at `dpi` without writing diff images.
///
/// Convenience wrapper around [`DocumentScorer`].
pub fn compare_documents(
    rasterizer: &dyn Rasterizer,
    reference: &Path,
    candidate: &Path,
    dpi: u32,
) -> DocumentResult {
    DocumentScorer::new(rasterizer, dpi).compare(reference, candidate)
}

/// Path of the diff image for a page: `<dir>/<ref-stem>_page<N>_diff.png`.
pub fn diff_image_path(dir: &Path, reference: &Path, page_index: usize) -> PathBuf {
    let stem = reference
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}_page{}_diff.png", stem, page_index))
}

fn write_diff_image(
    dir: &Path,
    reference: &Path,
    page_index: usize,
    map: &SimilarityMap,
) -> Result<()> {
    if map.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    let path = diff_image_path(dir, reference, page_index);
    map.to_gray_image().save(&path)?;
    log::debug!("Wrote diff image {}", path.display());
    Ok(())
}
