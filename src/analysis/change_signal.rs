//! Per-frame-pair change signal (optical flow + color divergence)

use image::GrayImage;

use crate::analysis::frame::VideoFrame;
use crate::analysis::histogram::ColorHistogram;
use crate::analysis::optical_flow::DenseFlowEstimator;
use crate::domain::model::ChangeSignal;

/// Stateful extractor comparing each sampled frame with the previous one
#[derive(Debug, Default)]
pub struct ChangeSignalExtractor {
    flow: DenseFlowEstimator,
    previous: Option<(GrayImage, ColorHistogram)>,
}

impl ChangeSignalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next sampled frame.
    ///
    /// Returns `None` for the first frame, which only becomes the reference.
    pub fn observe(&mut self, frame: &VideoFrame) -> Option<ChangeSignal> {
        let gray = frame.to_gray();
        let histogram = ColorHistogram::from_image(frame.rgb());

        let signal = self.previous.as_ref().map(|(prev_gray, prev_hist)| {
            let motion = self.flow.mean_magnitude(prev_gray, &gray);
            let divergence = prev_hist.divergence(&histogram);
            ChangeSignal::new(motion, divergence)
        });

        self.previous = Some((gray, histogram));
        signal
    }

    /// Forget the reference frame
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
