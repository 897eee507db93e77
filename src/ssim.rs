//! Windowed structural similarity (SSIM) over grayscale images.
//!
//! Implements the formulation of Wang et al. (2004) with a uniform 7×7
//! window, `K1 = 0.01`, `K2 = 0.03`, a data range of 255 and sample
//! covariance normalisation. Local statistics come from a separable box
//! filter with half-sample symmetric borders, so the per-pixel map covers the
//! whole image while the scalar score averages only the interior where the
//! window fits without padding.
//!
//! All window sums are taken over integer pixel values (and their products),
//! which `f64` represents exactly, so identical inputs score exactly `1.0`.

use image::{GrayImage, Luma};

/// Side length of the square comparison window.
pub const WINDOW_SIZE: usize = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Per-pixel similarity values for a compared region, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl SimilarityMap {
    /// Map of a zero-area comparison.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            values: Vec::new(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the map covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw similarity values, row-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Similarity at `(x, y)`, if inside the map.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Render the map as an 8-bit grayscale image: similarity clamped to
    /// `[0, 1]` and scaled to `0..=255` (dark = dissimilar).
    pub fn to_gray_image(&self) -> GrayImage {
        let width = self.width as usize;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let v = self.values[y as usize * width + x as usize];
            Luma([(v.clamp(0.0, 1.0) * 255.0) as u8])
        })
    }
}

/// Scalar score plus full map.
#[derive(Debug, Clone)]
pub struct SsimOutput {
    /// Mean similarity over the interior, clamped to `[0, 1]`.
    pub score: f64,
    /// Per-pixel similarity of the compared region.
    pub map: SimilarityMap,
}

/// Compute SSIM between two grayscale images.
///
/// Images are expected to have the same dimensions; if they do not, only
/// the top-left intersection is compared. A zero-area intersection scores
/// `0.0` with an empty map. Images narrower or shorter than
/// [`WINDOW_SIZE`] use the largest odd window that fits.
pub fn structural_similarity(reference: &GrayImage, candidate: &GrayImage) -> SsimOutput {
    let width = reference.width().min(candidate.width()) as usize;
    let height = reference.height().min(candidate.height()) as usize;

    if width == 0 || height == 0 {
        return SsimOutput {
            score: 0.0,
            map: SimilarityMap::empty(),
        };
    }

    let win = window_size(width, height);
    let radius = (win - 1) / 2;

    let x = samples(reference, width, height);
    let y = samples(candidate, width, height);
    let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f64> = x.iter().zip(&y).map(|(a, b)| a * b).collect();

    let ux = box_mean(&x, width, height, radius);
    let uy = box_mean(&y, width, height, radius);
    let uxx = box_mean(&xx, width, height, radius);
    let uyy = box_mean(&yy, width, height, radius);
    let uxy = box_mean(&xy, width, height, radius);

    let np = (win * win) as f64;
    let cov_norm = if np > 1.0 { np / (np - 1.0) } else { 1.0 };
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut values = Vec::with_capacity(width * height);
    let mut interior_sum = 0.0f64;
    let mut interior_count = 0usize;

    for row in 0..height {
        for col in 0..width {
            let i = row * width + col;
            let (mx, my) = (ux[i], uy[i]);
            let vx = cov_norm * (uxx[i] - mx * mx);
            let vy = cov_norm * (uyy[i] - my * my);
            let vxy = cov_norm * (uxy[i] - mx * my);

            let a1 = 2.0 * mx * my + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = mx * mx + my * my + c1;
            let b2 = vx + vy + c2;
            let s = (a1 * a2) / (b1 * b2);

            if row >= radius && row < height - radius && col >= radius && col < width - radius {
                interior_sum += s;
                interior_count += 1;
            }
            values.push(s as f32);
        }
    }

    // The window always fits at least once, so the interior is never empty.
    let score = if interior_count > 0 {
        interior_sum / interior_count as f64
    } else {
        0.0
    };

    SsimOutput {
        score: score.clamp(0.0, 1.0),
        map: SimilarityMap {
            width: width as u32,
            height: height as u32,
            values,
        },
    }
}

/// Largest odd window no larger than [`WINDOW_SIZE`] that fits the image.
fn window_size(width: usize, height: usize) -> usize {
    let side = width.min(height).min(WINDOW_SIZE);
    if side % 2 == 0 {
        side - 1
    } else {
        side
    }
}

fn samples(image: &GrayImage, width: usize, height: usize) -> Vec<f64> {
    let stride = image.width() as usize;
    let raw = image.as_raw();
    let mut out = Vec::with_capacity(width * height);
    for row in 0..height {
        let start = row * stride;
        out.extend(raw[start..start + width].iter().map(|&v| f64::from(v)));
    }
    out
}

/// Half-sample symmetric index (`d c b a | a b c d | d c b a`). Valid while
/// the overhang is smaller than `n`, which the window sizing guarantees.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    if i < 0 {
        (-i - 1) as usize
    } else if i >= n {
        (2 * n - i - 1) as usize
    } else {
        i as usize
    }
}

/// Mean over a `(2r+1)²` window centred on each pixel.
fn box_mean(src: &[f64], width: usize, height: usize, radius: usize) -> Vec<f64> {
    let r = radius as isize;
    let win = 2 * radius + 1;

    let mut horizontal = vec![0.0f64; width * height];
    for row in 0..height {
        let line = &src[row * width..(row + 1) * width];
        let out = &mut horizontal[row * width..(row + 1) * width];
        let mut acc: f64 = (-r..=r).map(|dx| line[reflect(dx, width)]).sum();
        out[0] = acc;
        for col in 1..width {
            let c = col as isize;
            acc += line[reflect(c + r, width)] - line[reflect(c - r - 1, width)];
            out[col] = acc;
        }
    }

    let mut acc = vec![0.0f64; width];
    for dy in -r..=r {
        let line = &horizontal[reflect(dy, height) * width..];
        for col in 0..width {
            acc[col] += line[col];
        }
    }

    let area = (win * win) as f64;
    let mut out = vec![0.0f64; width * height];
    out[..width]
        .iter_mut()
        .zip(&acc)
        .for_each(|(o, a)| *o = a / area);

    for row in 1..height {
        let rr = row as isize;
        let add = reflect(rr + r, height) * width;
        let sub = reflect(rr - r - 1, height) * width;
        for col in 0..width {
            acc[col] += horizontal[add + col] - horizontal[sub + col];
            out[row * width + col] = acc[col] / area;
        }
    }

    out
}
