//! Fuzzy connectedness segmentation
//!
//! Grows a region from seed pixels by max-min propagation: the strength of
//! a pixel is the best, over all paths from a seed, of the weakest affinity
//! along the path. Affinity between 4-neighbours is the smaller of two
//! Gaussians, one over the pair's average intensity and one over their
//! relative difference, fitted to the pixels around the seeds.
//!
//! Propagation only steps between pixels inside the region of interest.
//! Thresholding the strengths at an alpha cut gives the segmented area.

use crate::error::{DemoError, Result};
use alloc::collections::BinaryHeap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Sigma used in place of zero so the Gaussian stays defined
const MIN_SIGMA: f32 = 0.000_001;

/// Borrowed single-channel image, row-major
#[derive(Debug, Clone, Copy)]
pub struct GrayImage<'a> {
    pixels: &'a [u32],
    width: usize,
    height: usize,
}

impl<'a> GrayImage<'a> {
    /// Wrap a pixel buffer of `width * height` values
    pub fn new(pixels: &'a [u32], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DemoError::InvalidImage);
        }
        let expected = width.checked_mul(height).ok_or(DemoError::InvalidImage)?;
        if pixels.len() != expected {
            return Err(DemoError::InvalidImage);
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &'a [u32] {
        self.pixels
    }

    fn value(&self, index: usize) -> f32 {
        self.pixels[index] as f32
    }
}

/// Inclusive pixel bounds that propagation may not leave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roi {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl Roi {
    pub const fn new(x_min: usize, x_max: usize, y_min: usize, y_max: usize) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// ROI covering a whole image
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, width.saturating_sub(1), 0, height.saturating_sub(1))
    }

    /// Number of pixels inside the bounds
    pub const fn area(&self) -> usize {
        (self.x_max - self.x_min + 1) * (self.y_max - self.y_min + 1)
    }

    /// Check ordering and that the bounds lie inside the image
    pub fn validate(&self, width: usize, height: usize) -> Result<()> {
        if self.x_min > self.x_max
            || self.y_min > self.y_max
            || self.x_max >= width
            || self.y_max >= height
        {
            return Err(DemoError::InvalidRoi);
        }
        Ok(())
    }
}

/// Average intensity of a pixel pair
pub fn ave(a: f32, b: f32) -> f32 {
    0.5 * (a + b)
}

/// Relative difference of a pixel pair, 0 when both are 0
pub fn rel_diff(a: f32, b: f32) -> f32 {
    if a + b == 0.0 {
        0.0
    } else {
        (a - b).abs() / (a + b)
    }
}

/// Unnormalised Gaussian, with a zero sigma replaced by a tiny one
pub fn gaussian(value: f32, mean: f32, sigma: f32) -> f32 {
    let sigma = if sigma == 0.0 { MIN_SIGMA } else { sigma };
    let d = value - mean;
    (-(d * d) / (2.0 * sigma * sigma)).exp()
}

/// Gaussian parameters fitted around the seeds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AffinityStats {
    pub mean_ave: f32,
    pub sigma_ave: f32,
    pub mean_rel_diff: f32,
    pub sigma_rel_diff: f32,
}

impl AffinityStats {
    /// Fit over every pair of distinct pixels neighbouring a seed
    ///
    /// With fewer than two pairs the sigmas are 0; with none the means are 0.
    pub fn fit(image: &GrayImage<'_>, roi: &Roi, seeds: &[usize]) -> Self {
        let mut spels: Vec<usize> = seeds
            .iter()
            .flat_map(|&seed| neighbors(seed, image.width, roi))
            .collect();
        spels.sort_unstable();
        spels.dedup();

        let mut aves = Vec::new();
        let mut rel_diffs = Vec::new();
        for (i, &c) in spels.iter().enumerate() {
            for &d in &spels[i + 1..] {
                let (fc, fd) = (image.value(c), image.value(d));
                aves.push(ave(fc, fd));
                rel_diffs.push(rel_diff(fc, fd));
            }
        }

        let (mean_ave, sigma_ave) = mean_and_sigma(&aves);
        let (mean_rel_diff, sigma_rel_diff) = mean_and_sigma(&rel_diffs);
        Self {
            mean_ave,
            sigma_ave,
            mean_rel_diff,
            sigma_rel_diff,
        }
    }

    /// Affinity of two pixel values
    pub fn affinity(&self, a: f32, b: f32) -> f32 {
        let g_ave = gaussian(ave(a, b), self.mean_ave, self.sigma_ave);
        let g_rel = gaussian(rel_diff(a, b), self.mean_rel_diff, self.sigma_rel_diff);
        g_ave.min(g_rel)
    }
}

/// Mean and sample standard deviation
fn mean_and_sigma(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    if values.len() < 2 {
        return (mean as f32, 0.0);
    }
    let mean32 = mean as f32;
    let variance = values
        .iter()
        .map(|&v| {
            let d = (v - mean32) as f64;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    (mean32, variance.sqrt() as f32)
}

/// 4-neighbours of `index` that stay inside the ROI bounds
fn neighbors(index: usize, width: usize, roi: &Roi) -> impl Iterator<Item = usize> {
    let x = index % width;
    let y = index / width;
    [
        (x > roi.x_min).then(|| index - 1),
        (x < roi.x_max).then(|| index + 1),
        (y > roi.y_min).then(|| index - width),
        (y < roi.y_max).then(|| index + width),
    ]
    .into_iter()
    .flatten()
}

/// Heap entry ordered by strength
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    strength: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.strength
            .total_cmp(&other.strength)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Connectedness strength per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectednessMap {
    pub width: usize,
    pub height: usize,
    pub strengths: Vec<f32>,
}

impl ConnectednessMap {
    /// Strength at `(x, y)`
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.strengths.get(y * self.width + x).copied()
    }

    /// Pixels whose strength reaches `alpha_percent / 100`
    pub fn alpha_cut_count(&self, alpha_percent: f32) -> usize {
        let threshold = alpha_percent as f64 / 100.0;
        self.strengths
            .iter()
            .filter(|&&s| s as f64 >= threshold)
            .count()
    }
}

/// Fuzzy connectedness over one image
#[derive(Debug, Clone)]
pub struct FuzzyConnectedness<'a> {
    image: GrayImage<'a>,
    roi: Roi,
    seeds: Vec<usize>,
}

impl<'a> FuzzyConnectedness<'a> {
    /// Set up a run; seeds are `(x, y)` and must lie inside the image
    pub fn new(image: GrayImage<'a>, roi: Roi, seeds: &[(usize, usize)]) -> Result<Self> {
        roi.validate(image.width, image.height)?;
        let seeds = seeds
            .iter()
            .map(|&(x, y)| {
                if x < image.width && y < image.height {
                    Ok(y * image.width + x)
                } else {
                    Err(DemoError::SeedOutOfBounds)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { image, roi, seeds })
    }

    /// Affinity parameters this run will use
    pub fn stats(&self) -> AffinityStats {
        AffinityStats::fit(&self.image, &self.roi, &self.seeds)
    }

    /// Propagate strengths from the seeds
    pub fn run(&self) -> ConnectednessMap {
        let stats = self.stats();
        let width = self.image.width;
        let mut strengths = vec![0.0f32; self.image.pixels.len()];
        let mut queue = BinaryHeap::new();

        for &seed in &self.seeds {
            strengths[seed] = 1.0;
            queue.push(Candidate {
                index: seed,
                strength: 1.0,
            });
        }

        while let Some(Candidate { index: c, strength }) = queue.pop() {
            // Stale entry, a stronger path was already found
            if strengths[c] > strength {
                continue;
            }
            let fc = self.image.value(c);
            for e in neighbors(c, width, &self.roi) {
                let f_min = strengths[c].min(stats.affinity(fc, self.image.value(e)));
                if f_min > strengths[e] {
                    strengths[e] = f_min;
                    queue.push(Candidate {
                        index: e,
                        strength: f_min,
                    });
                }
            }
        }

        ConnectednessMap {
            width,
            height: self.image.height,
            strengths,
        }
    }
}

/// Segmented pixel count for one image and seed at the given alpha cut
pub fn alpha_cut_volume(
    image: GrayImage<'_>,
    roi: Roi,
    seed: (usize, usize),
    alpha_percent: f32,
) -> Result<usize> {
    let map = FuzzyConnectedness::new(image, roi, &[seed])?.run();
    Ok(map.alpha_cut_count(alpha_percent))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left `split` columns at `left`, the rest at `right`
    fn two_region(width: usize, height: usize, split: usize, left: u32, right: u32) -> Vec<u32> {
        (0..width * height)
            .map(|i| if i % width < split { left } else { right })
            .collect()
    }

    #[test]
    fn test_image_validation() {
        let pixels = [0u32; 12];
        assert!(GrayImage::new(&pixels, 4, 3).is_ok());
        assert_eq!(
            GrayImage::new(&pixels, 5, 3).unwrap_err(),
            DemoError::InvalidImage
        );
        assert_eq!(
            GrayImage::new(&pixels, 0, 3).unwrap_err(),
            DemoError::InvalidImage
        );
    }

    #[test]
    fn test_roi_validation() {
        assert_eq!(Roi::full(4, 3), Roi::new(0, 3, 0, 2));
        assert_eq!(Roi::full(4, 3).area(), 12);
        assert_eq!(Roi::new(0, 3, 0, 2).validate(4, 3), Ok(()));
        assert_eq!(Roi::new(0, 4, 0, 2).validate(4, 3), Err(DemoError::InvalidRoi));
        assert_eq!(Roi::new(2, 1, 0, 2).validate(4, 3), Err(DemoError::InvalidRoi));
    }

    #[test]
    fn test_pair_features() {
        assert_eq!(ave(100.0, 300.0), 200.0);
        assert_eq!(rel_diff(100.0, 300.0), 0.5);
        assert_eq!(rel_diff(0.0, 0.0), 0.0);
        assert_eq!(gaussian(5.0, 5.0, 0.0), 1.0);
        assert_eq!(gaussian(6.0, 5.0, 0.0), 0.0);
        assert!((gaussian(6.0, 5.0, 1.0) - (-0.5f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_mean_and_sigma() {
        assert_eq!(mean_and_sigma(&[]), (0.0, 0.0));
        assert_eq!(mean_and_sigma(&[3.0]), (3.0, 0.0));
        let (mean, sigma) = mean_and_sigma(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        // sample variance 32 / 7
        assert!((sigma - (32.0f32 / 7.0).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_image_fully_connected() {
        let pixels = vec![100u32; 25];
        let image = GrayImage::new(&pixels, 5, 5).unwrap();
        let fc = FuzzyConnectedness::new(image, Roi::full(5, 5), &[(2, 2)]).unwrap();

        let stats = fc.stats();
        assert_eq!(stats.mean_ave, 100.0);
        assert_eq!(stats.sigma_ave, 0.0);
        assert_eq!(stats.mean_rel_diff, 0.0);

        let map = fc.run();
        assert!(map.strengths.iter().all(|&s| s == 1.0));
        assert_eq!(map.alpha_cut_count(50.0), 25);
    }

    #[test]
    fn test_edge_stops_propagation() {
        let pixels = two_region(6, 4, 3, 100, 1000);
        let image = GrayImage::new(&pixels, 6, 4).unwrap();
        let map = FuzzyConnectedness::new(image, Roi::full(6, 4), &[(1, 1)])
            .unwrap()
            .run();

        assert_eq!(map.get(0, 0), Some(1.0));
        assert_eq!(map.get(2, 3), Some(1.0));
        assert_eq!(map.get(3, 0), Some(0.0));
        assert_eq!(map.get(5, 3), Some(0.0));
        assert_eq!(map.get(6, 0), None);
        assert_eq!(map.alpha_cut_count(50.0), 12);
        assert_eq!(map.alpha_cut_count(0.0), 24);
    }

    #[test]
    fn test_roi_bounds_propagation() {
        let pixels = vec![100u32; 36];
        let image = GrayImage::new(&pixels, 6, 6).unwrap();
        let roi = Roi::new(1, 3, 1, 3);
        let map = FuzzyConnectedness::new(image, roi, &[(2, 2)]).unwrap().run();

        assert_eq!(map.alpha_cut_count(50.0), roi.area());
        assert_eq!(map.get(0, 2), Some(0.0));
        assert_eq!(map.get(4, 2), Some(0.0));
        assert_eq!(map.get(1, 1), Some(1.0));
    }

    #[test]
    fn test_no_seeds_segments_nothing() {
        let pixels = vec![100u32; 9];
        let image = GrayImage::new(&pixels, 3, 3).unwrap();
        let map = FuzzyConnectedness::new(image, Roi::full(3, 3), &[]).unwrap().run();
        assert_eq!(map.alpha_cut_count(1.0), 0);
    }

    #[test]
    fn test_invalid_inputs() {
        let pixels = vec![100u32; 9];
        let image = GrayImage::new(&pixels, 3, 3).unwrap();
        assert_eq!(
            FuzzyConnectedness::new(image, Roi::full(3, 3), &[(3, 0)]).unwrap_err(),
            DemoError::SeedOutOfBounds
        );
        assert_eq!(
            alpha_cut_volume(image, Roi::new(0, 3, 0, 2), (1, 1), 50.0),
            Err(DemoError::InvalidRoi)
        );
    }

    #[test]
    fn test_alpha_cut_volume() {
        let pixels = two_region(6, 4, 3, 100, 1000);
        let image = GrayImage::new(&pixels, 6, 4).unwrap();
        assert_eq!(alpha_cut_volume(image, Roi::full(6, 4), (1, 1), 50.0), Ok(12));
        assert_eq!(alpha_cut_volume(image, Roi::full(6, 4), (4, 2), 50.0), Ok(12));
    }
}
