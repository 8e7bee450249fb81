//! Per-scene motion activity (changed-pixel accumulation)

use image::GrayImage;
use tracing::trace;

use crate::domain::errors::DomainError;
use crate::domain::model::{MotionParams, Scene};
use crate::ports::FrameCursor;

/// Counts pixels that change between consecutive frames inside a scene
#[derive(Debug, Clone)]
pub struct MotionActivityAggregator {
    pixel_threshold: u8,
}

impl MotionActivityAggregator {
    pub fn new(params: &MotionParams) -> Self {
        Self {
            pixel_threshold: params.pixel_threshold,
        }
    }

    /// Total changed-pixel count over `[scene.start, scene.end)`.
    ///
    /// The first readable frame is the reference; a scene without readable
    /// frames scores zero.
    pub fn aggregate(&self, cursor: &mut dyn FrameCursor, scene: &Scene) -> Result<f64, DomainError> {
        cursor.seek(scene.start())?;

        let mut previous = match cursor.next_frame()? {
            Some(frame) if frame.timestamp() < scene.end() => frame.to_gray(),
            _ => return Ok(0.0),
        };

        let mut total: u64 = 0;
        let mut frames = 1usize;
        while let Some(frame) = cursor.next_frame()? {
            if frame.timestamp() >= scene.end() {
                break;
            }
            let gray = frame.to_gray();
            total += self.changed_pixels(&previous, &gray);
            previous = gray;
            frames += 1;
        }

        trace!(scene = %scene, frames, changed_pixels = total, "Motion activity aggregated");
        Ok(total as f64)
    }

    /// Pixels whose absolute difference exceeds the threshold
    pub fn changed_pixels(&self, previous: &GrayImage, current: &GrayImage) -> u64 {
        previous
            .pixels()
            .zip(current.pixels())
            .filter(|(a, b)| a[0].abs_diff(b[0]) > self.pixel_threshold)
            .count() as u64
    }
}
