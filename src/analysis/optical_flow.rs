//! Dense optical flow estimation (Lucas-Kanade over a sliding window)
//!
//! Every pixel gets a flow vector solved from the structure tensor of its
//! neighbourhood. Window sums come from integral images, so the cost is linear
//! in the pixel count regardless of the window size. Pixels whose smaller
//! tensor eigenvalue falls below [`MIN_EIGENVALUE`] (flat or purely linear
//! texture) contribute zero motion.

use image::GrayImage;

/// Half-size of the square aggregation window (5x5)
pub const WINDOW_RADIUS: usize = 2;
/// Minimum smaller eigenvalue of the structure tensor for a reliable estimate
pub const MIN_EIGENVALUE: f64 = 25.0;
/// Upper bound on a single pixel's flow magnitude
pub const MAX_PIXEL_FLOW: f64 = 16.0;

/// Dense flow estimator producing a mean flow magnitude between two frames
#[derive(Debug, Clone)]
pub struct DenseFlowEstimator {
    window_radius: usize,
    min_eigenvalue: f64,
}

impl Default for DenseFlowEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseFlowEstimator {
    pub fn new() -> Self {
        Self {
            window_radius: WINDOW_RADIUS,
            min_eigenvalue: MIN_EIGENVALUE,
        }
    }

    /// Mean flow magnitude (pixels per frame) from `prev` to `next`.
    ///
    /// Frames of different sizes are compared over their common area.
    pub fn mean_magnitude(&self, prev: &GrayImage, next: &GrayImage) -> f64 {
        let width = prev.width().min(next.width()) as usize;
        let height = prev.height().min(next.height()) as usize;
        if width < 3 || height < 3 {
            return 0.0;
        }

        let prev_px = |x: usize, y: usize| prev.get_pixel(x as u32, y as u32)[0] as f64;
        let next_px = |x: usize, y: usize| next.get_pixel(x as u32, y as u32)[0] as f64;

        // Per-pixel products of the gradients, laid out row-major
        let mut ixx = vec![0.0; width * height];
        let mut iyy = vec![0.0; width * height];
        let mut ixy = vec![0.0; width * height];
        let mut ixt = vec![0.0; width * height];
        let mut iyt = vec![0.0; width * height];

        for y in 0..height {
            let y0 = y.saturating_sub(1);
            let y1 = (y + 1).min(height - 1);
            for x in 0..width {
                let x0 = x.saturating_sub(1);
                let x1 = (x + 1).min(width - 1);

                let ix = ((prev_px(x1, y) - prev_px(x0, y)) + (next_px(x1, y) - next_px(x0, y)))
                    / (2.0 * (x1 - x0) as f64);
                let iy = ((prev_px(x, y1) - prev_px(x, y0)) + (next_px(x, y1) - next_px(x, y0)))
                    / (2.0 * (y1 - y0) as f64);
                let it = next_px(x, y) - prev_px(x, y);

                let i = y * width + x;
                ixx[i] = ix * ix;
                iyy[i] = iy * iy;
                ixy[i] = ix * iy;
                ixt[i] = ix * it;
                iyt[i] = iy * it;
            }
        }

        let sxx = IntegralImage::new(&ixx, width, height);
        let syy = IntegralImage::new(&iyy, width, height);
        let sxy = IntegralImage::new(&ixy, width, height);
        let sxt = IntegralImage::new(&ixt, width, height);
        let syt = IntegralImage::new(&iyt, width, height);

        let r = self.window_radius;
        let mut total = 0.0;
        for y in 0..height {
            let (top, bottom) = (y.saturating_sub(r), (y + r).min(height - 1));
            for x in 0..width {
                let (left, right) = (x.saturating_sub(r), (x + r).min(width - 1));

                let a = sxx.window_sum(left, top, right, bottom);
                let d = syy.window_sum(left, top, right, bottom);
                let b = sxy.window_sum(left, top, right, bottom);
                let p = sxt.window_sum(left, top, right, bottom);
                let q = syt.window_sum(left, top, right, bottom);

                let trace = a + d;
                let det = a * d - b * b;
                let discriminant = (trace * trace / 4.0 - det).max(0.0).sqrt();
                let min_eigen = trace / 2.0 - discriminant;
                if min_eigen < self.min_eigenvalue || det <= 0.0 {
                    continue;
                }

                // Solve [a b; b d] [u v]^T = -[p q]^T
                let u = (-d * p + b * q) / det;
                let v = (b * p - a * q) / det;
                total += (u * u + v * v).sqrt().min(MAX_PIXEL_FLOW);
            }
        }

        total / (width * height) as f64
    }
}

/// Summed-area table over a row-major buffer
struct IntegralImage {
    sums: Vec<f64>,
    stride: usize,
}

impl IntegralImage {
    fn new(values: &[f64], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += values[y * width + x];
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { sums, stride }
    }

    /// Inclusive window sum
    fn window_sum(&self, left: usize, top: usize, right: usize, bottom: usize) -> f64 {
        let s = self.stride;
        self.sums[(bottom + 1) * s + right + 1] - self.sums[top * s + right + 1]
            - self.sums[(bottom + 1) * s + left]
            + self.sums[top * s + left]
    }
}
