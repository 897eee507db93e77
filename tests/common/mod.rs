//! Shared fixtures: synthetic page images and an in-memory rasterizer.

#![allow(dead_code)]

use image::Rgb;
use pdf_parity::rasterizer::{PageImage, Rasterizer};
use pdf_parity::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Textured page whose content depends on `seed`. Different seeds give
/// structurally unrelated pages.
pub fn page(width: u32, height: u32, seed: u32) -> PageImage {
    let fx = seed * 3 + 1;
    let fy = seed * 5 + 2;
    PageImage::from_fn(width, height, |x, y| {
        let v = ((x * fx + y * fy + (x * y) % (seed + 7)) % 256) as u8;
        Rgb([v, v.wrapping_add(40), v.wrapping_mul(3)])
    })
}

/// `count` distinct pages of the same size.
pub fn pages(count: u32, width: u32, height: u32) -> Vec<PageImage> {
    (0..count).map(|i| page(width, height, i + 1)).collect()
}

enum Fixture {
    Pages(Vec<PageImage>),
    Failure(String),
}

/// Rasterizer serving pre-built pages by path and counting calls.
#[derive(Default)]
pub struct FakeRasterizer {
    documents: HashMap<PathBuf, Fixture>,
    calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>, pages: Vec<PageImage>) -> Self {
        self.documents.insert(path.into(), Fixture::Pages(pages));
        self
    }

    pub fn with_failure(mut self, path: impl Into<PathBuf>, message: &str) -> Self {
        self.documents
            .insert(path.into(), Fixture::Failure(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(&self, pdf: &Path, _dpi: u32) -> Result<Vec<PageImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.documents.get(pdf) {
            Some(Fixture::Pages(pages)) => Ok(pages.clone()),
            Some(Fixture::Failure(message)) => Err(Error::Rasterization {
                path: pdf.to_path_buf(),
                reason: message.clone(),
            }),
            None => Err(Error::Rasterization {
                path: pdf.to_path_buf(),
                reason: "unknown fixture".to_string(),
            }),
        }
    }
}
