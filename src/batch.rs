//! Batch comparison of two directory trees.
//!
//! Reference PDFs are discovered recursively and paired with candidates at
//! the same relative path. Documents are scored on a bounded worker pool;
//! results come back in discovery order whatever the pool size, and a
//! missing candidate is recorded without touching the rasterizer.

use crate::config::CompareConfig;
use crate::document::{DocumentResult, DocumentScorer};
use crate::error::{Error, Result};
use crate::rasterizer::Rasterizer;
use crate::report::{self, ComparisonSummary, REPORT_FILE, SUMMARY_FILE};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Find every `.pdf` below `root`, returned relative to `root` and sorted.
pub fn discover_pdfs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::InputDirectory(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            // Symlinked directories are not descended into.
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("pdf") {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Runs a configured comparison over two directory trees.
pub struct BatchRunner<'a> {
    config: &'a CompareConfig,
    rasterizer: &'a dyn Rasterizer,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner. The configuration is validated by [`run`](Self::run).
    pub fn new(config: &'a CompareConfig, rasterizer: &'a dyn Rasterizer) -> Self {
        Self { config, rasterizer }
    }

    /// Score every discovered document.
    pub fn run(&self) -> Result<Vec<DocumentResult>> {
        self.run_with_progress(|_, _, _| {})
    }

    /// Score every discovered document, calling `progress(done, total, result)`
    /// as each one finishes. With more than one job the callback runs on
    /// worker threads and completion order is not discovery order.
    pub fn run_with_progress<F>(&self, progress: F) -> Result<Vec<DocumentResult>>
    where
        F: Fn(usize, usize, &DocumentResult) + Sync,
    {
        self.config.validate()?;

        let mut references = discover_pdfs(&self.config.reference_dir)?;
        if let Some(limit) = self.config.limit {
            references.truncate(limit);
        }
        let total = references.len();
        log::info!(
            "Comparing {} reference PDFs from {} against {}",
            total,
            self.config.reference_dir.display(),
            self.config.candidate_dir.display()
        );

        let diff_dir = self.config.diff_dir();
        if let Some(dir) = &diff_dir {
            // Diffs are regenerated in full on every run.
            if dir.exists() {
                fs::remove_dir_all(dir)?;
            }
        }

        let mut scorer = DocumentScorer::new(self.rasterizer, self.config.dpi);
        if let Some(dir) = diff_dir {
            scorer = scorer.with_diff_dir(dir);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot start worker pool: {}", e)))?;

        let done = AtomicUsize::new(0);
        let results = pool.install(|| {
            references
                .par_iter()
                .map(|relative| {
                    let result = self.compare_one(&scorer, relative);
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(finished, total, &result);
                    result
                })
                .collect::<Vec<_>>()
        });

        Ok(results)
    }

    fn compare_one(&self, scorer: &DocumentScorer<'_>, relative: &Path) -> DocumentResult {
        let reference = self.config.reference_dir.join(relative);
        let candidate = self.config.candidate_dir.join(relative);

        if !candidate.exists() {
            log::warn!("No candidate for {}", relative.display());
            return DocumentResult::missing(relative, candidate);
        }

        scorer.compare(&reference, &candidate).with_reference_path(relative)
    }

    /// Write `comparison-results.json` and `VISUAL-QUALITY-REPORT.md` into the
    /// output directory and return the summary.
    pub fn write_artifacts(&self, results: Vec<DocumentResult>) -> Result<ComparisonSummary> {
        write_artifacts(&self.config.output_dir, results, self.config.dpi)
    }
}

/// Write the JSON summary and Markdown report for `results` into `output_dir`.
pub fn write_artifacts(
    output_dir: &Path,
    results: Vec<DocumentResult>,
    dpi: u32,
) -> Result<ComparisonSummary> {
    fs::create_dir_all(output_dir)?;

    let summary = report::build_summary(results, dpi);
    let json_path = output_dir.join(SUMMARY_FILE);
    summary.write_json(&json_path)?;
    log::info!("Wrote {}", json_path.display());

    let report_path = output_dir.join(REPORT_FILE);
    report::write_markdown_report(&summary.results, &report_path)?;
    log::info!("Wrote {}", report_path.display());

    Ok(summary)
}
