// In-memory media adapter - decoded frames and audio held in memory

use std::path::Path;
use std::sync::Arc;

use crate::analysis::audio::AudioTrack;
use crate::analysis::frame::VideoFrame;
use crate::domain::errors::DomainError;
use crate::domain::model::VideoInfo;
use crate::ports::{FrameCursor, MediaPort, VideoSource};

/// Cursor over a shared, pre-decoded frame list
pub struct MemoryFrameCursor {
    frames: Arc<Vec<VideoFrame>>,
    position: usize,
    fail_at: Option<usize>,
}

impl MemoryFrameCursor {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self::shared(Arc::new(frames), None)
    }

    fn shared(frames: Arc<Vec<VideoFrame>>, fail_at: Option<usize>) -> Self {
        Self {
            frames,
            position: 0,
            fail_at,
        }
    }

    fn check(&self) -> Result<(), DomainError> {
        match self.fail_at {
            Some(index) if self.position >= index => Err(DomainError::SourceUnreadable(format!(
                "decode error at frame {}",
                index
            ))),
            _ => Ok(()),
        }
    }
}

impl FrameCursor for MemoryFrameCursor {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, DomainError> {
        if self.position >= self.frames.len() {
            return Ok(None);
        }
        self.check()?;
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(Some(frame))
    }

    fn skip_frames(&mut self, count: usize) -> Result<usize, DomainError> {
        let skipped = count.min(self.frames.len() - self.position);
        self.position += skipped;
        Ok(skipped)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DomainError> {
        self.position = self
            .frames
            .iter()
            .position(|f| f.timestamp() >= seconds)
            .unwrap_or(self.frames.len());
        Ok(())
    }
}

/// Video source backed by a frame list
#[derive(Clone)]
pub struct MemoryVideoSource {
    info: VideoInfo,
    frames: Arc<Vec<VideoFrame>>,
    fail_at: Option<usize>,
}

impl MemoryVideoSource {
    /// Build a source; frames are expected in presentation order.
    ///
    /// Dimensions come from the first frame, duration from `frames.len() / fps`.
    pub fn new(frames: Vec<VideoFrame>, fps: f64) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        let duration = if fps > 0.0 {
            frames.len() as f64 / fps
        } else {
            0.0
        };
        Self {
            info: VideoInfo {
                fps,
                duration,
                width,
                height,
            },
            frames: Arc::new(frames),
            fail_at: None,
        }
    }

    /// Make every cursor fail once it reaches frame `index`
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.info.duration = duration;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl VideoSource for MemoryVideoSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn cursor(&self) -> Result<Box<dyn FrameCursor>, DomainError> {
        Ok(Box::new(MemoryFrameCursor::shared(
            Arc::clone(&self.frames),
            self.fail_at,
        )))
    }
}

/// Media port serving the same in-memory source for every path
#[derive(Clone, Default)]
pub struct MemoryMediaAdapter {
    video: Option<MemoryVideoSource>,
    audio: Option<AudioTrack>,
}

impl MemoryMediaAdapter {
    pub fn new(video: MemoryVideoSource) -> Self {
        Self {
            video: Some(video),
            audio: None,
        }
    }

    /// Adapter whose sources cannot be opened
    pub fn unreadable() -> Self {
        Self::default()
    }

    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }
}

impl MediaPort for MemoryMediaAdapter {
    fn open_video(&self, path: &Path) -> Result<Arc<dyn VideoSource>, DomainError> {
        match &self.video {
            Some(video) => Ok(Arc::new(video.clone())),
            None => Err(DomainError::SourceUnreadable(format!(
                "cannot open {}",
                path.display()
            ))),
        }
    }

    fn open_audio(&self, path: &Path) -> Result<Option<AudioTrack>, DomainError> {
        if self.video.is_none() {
            return Err(DomainError::SourceUnreadable(format!(
                "cannot open {}",
                path.display()
            )));
        }
        Ok(self.audio.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frames(count: usize) -> Vec<VideoFrame> {
        (0..count)
            .map(|i| VideoFrame::new(i as f64, RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0]))))
            .collect()
    }

    #[test]
    fn test_cursor_reads_skips_and_seeks() {
        let mut cursor = MemoryFrameCursor::new(frames(5));
        assert_eq!(cursor.next_frame().unwrap().unwrap().timestamp(), 0.0);
        assert_eq!(cursor.skip_frames(2).unwrap(), 2);
        assert_eq!(cursor.next_frame().unwrap().unwrap().timestamp(), 3.0);
        assert_eq!(cursor.skip_frames(10).unwrap(), 1);
        assert!(cursor.next_frame().unwrap().is_none());

        cursor.seek(1.5).unwrap();
        assert_eq!(cursor.next_frame().unwrap().unwrap().timestamp(), 2.0);
    }

    #[test]
    fn test_cursors_are_independent() {
        let source = MemoryVideoSource::new(frames(3), 1.0);
        let mut a = source.cursor().unwrap();
        let mut b = source.cursor().unwrap();
        a.skip_frames(2).unwrap();
        assert_eq!(b.next_frame().unwrap().unwrap().timestamp(), 0.0);
        assert_eq!(a.next_frame().unwrap().unwrap().timestamp(), 2.0);
    }

    #[test]
    fn test_failing_source() {
        let source = MemoryVideoSource::new(frames(3), 1.0).failing_at(1);
        let mut cursor = source.cursor().unwrap();
        assert!(cursor.next_frame().unwrap().is_some());
        assert!(matches!(
            cursor.next_frame(),
            Err(DomainError::SourceUnreadable(_))
        ));
    }

    #[test]
    fn test_source_info() {
        let source = MemoryVideoSource::new(frames(10), 2.0);
        assert_eq!(source.info().duration, 5.0);
        assert_eq!(source.info().width, 2);
        assert_eq!(source.frame_count(), 10);
    }

    #[test]
    fn test_unreadable_adapter() {
        let adapter = MemoryMediaAdapter::unreadable();
        assert!(adapter.open_video(Path::new("missing.mp4")).is_err());
    }
}
