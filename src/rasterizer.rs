//! Page rasterization adapter.
//!
//! The engine never renders PDFs itself. A [`Rasterizer`] turns a PDF file into
//! one RGB image per page, in page order. The production implementation,
//! [`PdftoppmRasterizer`], drives poppler's `pdftoppm` executable and decodes
//! the PNG files it writes into a scratch directory.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_parity::rasterizer::{PdftoppmRasterizer, Rasterizer};
//!
//! let rasterizer = PdftoppmRasterizer::new();
//! rasterizer.check_available()?;
//! let pages = rasterizer.rasterize("report.pdf".as_ref(), 150)?;
//! println!("{} pages", pages.len());
//! ```

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A rendered page: width × height RGB, 8 bits per sample.
pub type PageImage = image::RgbImage;

/// Converts a PDF file into page images.
///
/// Implementations must be usable from several worker threads at once.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `pdf` at `dpi`, in page order. A document
    /// without pages yields an empty vector.
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<PageImage>>;
}

/// Rasterizer backed by the `pdftoppm` command-line tool.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdftoppmRasterizer {
    /// Executable looked up on `PATH` by default.
    pub const DEFAULT_PROGRAM: &'static str = "pdftoppm";

    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(Self::DEFAULT_PROGRAM)
    }

    /// Use a specific `pdftoppm` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this rasterizer runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Verify that the executable can be started, returning its version line.
    ///
    /// Run this once before accepting work: a missing rasterizer is the only
    /// condition that aborts a whole run.
    pub fn check_available(&self) -> Result<String> {
        let output = Command::new(&self.program).arg("-v").output().map_err(|e| {
            Error::RasterizerUnavailable(format!(
                "cannot run '{}' ({}); install poppler-utils",
                self.program.display(),
                e
            ))
        })?;

        // pdftoppm prints its version to stderr and, depending on the poppler
        // release, exits with a non-zero status for -v.
        let text = if output.stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            String::from_utf8_lossy(&output.stderr).into_owned()
        };
        let version = text.lines().next().unwrap_or("").trim().to_string();
        log::debug!("Rasterizer available: {} ({})", self.program.display(), version);
        Ok(version)
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<PageImage>> {
        let scratch = tempfile::Builder::new().prefix("pdf-parity-").tempdir()?;
        let prefix = scratch.path().join("page");

        log::debug!("Rasterizing {} at {} dpi", pdf.display(), dpi);

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                Error::RasterizerUnavailable(format!(
                    "cannot run '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // A document without pages makes pdftoppm reject the default range.
            if stderr.contains("Wrong page range") {
                return Ok(Vec::new());
            }
            return Err(Error::Rasterization {
                path: pdf.to_path_buf(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let mut files: Vec<(usize, PathBuf)> = fs::read_dir(scratch.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        files.sort_by_key(|(n, _)| *n);

        let mut pages = Vec::with_capacity(files.len());
        for (_, path) in files {
            pages.push(image::open(&path)?.to_rgb8());
        }

        log::debug!("Rasterized {} pages from {}", pages.len(), pdf.display());
        Ok(pages)
    }
}

/// Page number from a `pdftoppm` output name such as `page-007.png`.
fn page_number(path: &Path) -> Option<usize> {
    if path.extension().and_then(|s| s.to_str()) != Some("png") {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}
