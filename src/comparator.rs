//! Page-level comparison: structural similarity plus page-size agreement.

use crate::rasterizer::PageImage;
use crate::ssim::{structural_similarity, SimilarityMap, SsimOutput};
use image::{GrayImage, Luma};

/// Outcome of comparing one reference page with one candidate page.
#[derive(Debug, Clone)]
pub struct PageComparison {
    /// SSIM of the overlapping region, in `[0, 1]`.
    pub ssim: f64,
    /// Agreement of the two page areas, `1.0` when equal.
    pub size_match: f64,
    /// Reference page size as `(width, height)`.
    pub ref_size: (u32, u32),
    /// Candidate page size as `(width, height)`.
    pub test_size: (u32, u32),
    /// Per-pixel similarity over the overlapping region.
    pub diff_map: SimilarityMap,
}

/// Compare two page images.
///
/// Both pages are cropped to their common top-left rectangle; no scaling or
/// alignment search is attempted. A size or aspect mismatch shows up in
/// [`PageComparison::size_match`] and is not folded into the SSIM score.
pub fn compare_pages(reference: &PageImage, candidate: &PageImage) -> PageComparison {
    let width = reference.width().min(candidate.width());
    let height = reference.height().min(candidate.height());

    let ref_gray = mean_luma(reference, width, height);
    let test_gray = mean_luma(candidate, width, height);
    let SsimOutput { score, map } = structural_similarity(&ref_gray, &test_gray);

    let ref_size = reference.dimensions();
    let test_size = candidate.dimensions();

    PageComparison {
        ssim: score,
        size_match: size_match(ref_size, test_size),
        ref_size,
        test_size,
        diff_map: map,
    }
}

/// Grayscale of the top-left `width × height` region using the unweighted
/// mean of the three channels, truncated to an integer.
pub fn mean_luma(image: &PageImage, width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8])
    })
}

/// `1 - |a_ref - a_test| / max(min(a_ref, a_test), 1)` over page areas.
///
/// Equals `1.0` only for equal areas and decreases strictly as the areas
/// drift apart; it turns negative once one page is more than twice the
/// other.
pub fn size_match(ref_size: (u32, u32), test_size: (u32, u32)) -> f64 {
    let ref_area = u64::from(ref_size.0) * u64::from(ref_size.1);
    let test_area = u64::from(test_size.0) * u64::from(test_size.1);
    let difference = ref_area.abs_diff(test_area) as f64;
    let smaller = ref_area.min(test_area).max(1) as f64;
    1.0 - difference / smaller
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_mean_luma_is_unweighted_and_truncated() {
        let img = PageImage::from_pixel(2, 2, Rgb([10, 20, 31]));
        let gray = mean_luma(&img, 2, 2);
        // (10 + 20 + 31) / 3 = 20.33
        assert_eq!(gray.get_pixel(0, 0).0[0], 20);

        let img = PageImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        assert_eq!(mean_luma(&img, 1, 1).get_pixel(0, 0).0[0], 85);
    }

    #[test]
    fn test_mean_luma_crops() {
        let img = PageImage::from_pixel(10, 8, Rgb([90, 90, 90]));
        let gray = mean_luma(&img, 4, 3);
        assert_eq!(gray.dimensions(), (4, 3));
    }

    #[test]
    fn test_size_match_equal() {
        assert_eq!(size_match((100, 200), (200, 100)), 1.0);
    }

    #[test]
    fn test_size_match_values() {
        // 100x100 vs 100x80: diff 2000 over 8000
        assert!((size_match((100, 100), (100, 80)) - 0.75).abs() < 1e-12);
        // Symmetric
        assert_eq!(size_match((100, 80), (100, 100)), size_match((100, 100), (100, 80)));
    }

    #[test]
    fn test_size_match_zero_area_guard() {
        let v = size_match((0, 0), (10, 10));
        assert_eq!(v, 1.0 - 100.0);
        assert_eq!(size_match((0, 5), (5, 0)), 1.0);
    }

    #[test]
    fn test_compare_identical_pages() {
        let img = PageImage::from_fn(30, 40, |x, y| Rgb([(x * 8) as u8, (y * 6) as u8, 128]));
        let result = compare_pages(&img, &img);
        assert_eq!(result.ssim, 1.0);
        assert_eq!(result.size_match, 1.0);
        assert_eq!(result.ref_size, (30, 40));
        assert_eq!(result.diff_map.width(), 30);
        assert_eq!(result.diff_map.height(), 40);
    }

    #[test]
    fn test_compare_crops_to_intersection() {
        let big = PageImage::from_pixel(40, 50, Rgb([255, 255, 255]));
        let small = PageImage::from_pixel(30, 60, Rgb([255, 255, 255]));
        let result = compare_pages(&big, &small);
        assert_eq!(result.ssim, 1.0);
        assert_eq!(result.diff_map.width(), 30);
        assert_eq!(result.diff_map.height(), 50);
        assert!(result.size_match < 1.0);
    }

    #[test]
    fn test_compare_degenerate_page() {
        let empty = PageImage::new(0, 0);
        let page = PageImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let result = compare_pages(&empty, &page);
        assert_eq!(result.ssim, 0.0);
        assert!(result.diff_map.is_empty());
    }
}
