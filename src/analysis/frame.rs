//! Decoded frame representation shared by the analysis stages

use image::{GrayImage, RgbImage};

use crate::domain::errors::DomainError;

/// A decoded RGB frame with its presentation timestamp
#[derive(Debug, Clone)]
pub struct VideoFrame {
    timestamp: f64,
    image: RgbImage,
}

impl VideoFrame {
    pub fn new(timestamp: f64, image: RgbImage) -> Self {
        Self { timestamp, image }
    }

    /// Build a frame from tightly packed RGB24 bytes
    pub fn from_rgb(
        timestamp: f64,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, DomainError> {
        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            DomainError::InternalError(format!(
                "RGB buffer does not match {}x{} frame",
                width, height
            ))
        })?;
        Ok(Self::new(timestamp, image))
    }

    /// Presentation timestamp in seconds
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Luma conversion used by optical flow and pixel differencing
    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }
}
