//! Hue x saturation color histogram and correlation metric

use image::RgbImage;

/// Hue bins (hue range 0-180, OpenCV 8-bit convention)
pub const HUE_BINS: usize = 50;
/// Saturation bins (saturation range 0-256)
pub const SATURATION_BINS: usize = 50;

const HUE_RANGE: f64 = 180.0;
const SATURATION_RANGE: f64 = 256.0;

/// Normalized 2-D hue x saturation histogram
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    bins: Vec<f64>,
}

impl ColorHistogram {
    /// Compute the histogram of a frame, min-max normalized to [0, 1]
    pub fn from_image(image: &RgbImage) -> Self {
        let mut bins = vec![0.0; HUE_BINS * SATURATION_BINS];

        for pixel in image.pixels() {
            let (hue, saturation) = hue_saturation(pixel[0], pixel[1], pixel[2]);
            let h_bin = ((hue / HUE_RANGE) * HUE_BINS as f64) as usize;
            let s_bin = ((saturation / SATURATION_RANGE) * SATURATION_BINS as f64) as usize;
            bins[h_bin.min(HUE_BINS - 1) * SATURATION_BINS + s_bin.min(SATURATION_BINS - 1)] += 1.0;
        }

        let mut histogram = Self { bins };
        histogram.normalize();
        histogram
    }

    fn normalize(&mut self) {
        let min = self.bins.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.bins.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        if range > 0.0 {
            for bin in &mut self.bins {
                *bin = (*bin - min) / range;
            }
        } else {
            for bin in &mut self.bins {
                *bin = 0.0;
            }
        }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Pearson correlation between two histograms, in [-1, 1].
    ///
    /// Two flat histograms correlate perfectly.
    pub fn correlation(&self, other: &ColorHistogram) -> f64 {
        let n = self.bins.len() as f64;
        let mean_a = self.bins.iter().sum::<f64>() / n;
        let mean_b = other.bins.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (a, b) in self.bins.iter().zip(other.bins.iter()) {
            let da = a - mean_a;
            let db = b - mean_b;
            numerator += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denominator = var_a * var_b;
        if denominator.abs() > f64::EPSILON {
            numerator / denominator.sqrt()
        } else {
            1.0
        }
    }

    /// `1 - correlation`, clamped to [0, 1]
    pub fn divergence(&self, other: &ColorHistogram) -> f64 {
        (1.0 - self.correlation(other)).clamp(0.0, 1.0)
    }
}

/// 8-bit HSV hue (0-180) and saturation (0-255) of an RGB pixel
pub fn hue_saturation(r: u8, g: u8, b: u8) -> (f64, f64) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    if delta == 0.0 {
        return (0.0, saturation);
    }

    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (hue / 2.0, saturation)
}
