//! Configuration for comparison runs.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 150;

/// Comparison run configuration.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Directory holding the reference PDFs.
    pub reference_dir: PathBuf,

    /// Directory holding the candidate PDFs at matching relative paths.
    pub candidate_dir: PathBuf,

    /// Directory that receives the JSON summary, Markdown report and diffs.
    pub output_dir: PathBuf,

    /// Rasterization resolution in dots per inch.
    pub dpi: u32,

    /// Maximum number of reference documents to process.
    pub limit: Option<usize>,

    /// Worker threads used for scoring documents.
    pub jobs: usize,

    /// Write diff images for low-scoring pages.
    pub emit_diffs: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompareConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            reference_dir: PathBuf::from("reference-pdfs"),
            candidate_dir: PathBuf::from("candidate-pdfs"),
            output_dir: PathBuf::from("comparison"),
            dpi: DEFAULT_DPI,
            limit: None,
            jobs: 1,
            emit_diffs: true,
        }
    }

    /// Set the reference directory.
    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = dir.into();
        self
    }

    /// Set the candidate directory.
    pub fn with_candidate_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.candidate_dir = dir.into();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the rasterization DPI.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Limit the number of documents processed.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the number of worker threads.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable or disable diff image output.
    pub fn with_diffs(mut self, enable: bool) -> Self {
        self.emit_diffs = enable;
        self
    }

    /// Directory that receives per-page diff images.
    pub fn diff_dir(&self) -> Option<PathBuf> {
        self.emit_diffs.then(|| self.output_dir.join("diffs"))
    }

    /// Check value ranges before any work is started.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(Error::InvalidConfig("dpi must be greater than zero".to_string()));
        }
        if self.jobs == 0 {
            return Err(Error::InvalidConfig("jobs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
