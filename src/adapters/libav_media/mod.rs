//! Media decoding adapter using libav bindings
//!
//! Video frames are decoded through a private decoder per cursor and scaled to
//! RGB24 at the analysis width. Audio is decoded once, downmixed to mono and
//! reduced to the configured sample rate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ffmpeg_next::format::sample::Type as SampleLayout;
use ffmpeg_next::format::Sample;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame;
use ffmpeg_next::{codec, decoder, format, media, Packet};
use tracing::{debug, info, warn};

use crate::analysis::audio::AudioTrack;
use crate::analysis::frame::VideoFrame;
use crate::domain::errors::DomainError;
use crate::domain::model::VideoInfo;
use crate::ports::{FrameCursor, MediaPort, VideoSource};

/// LibAV-based media adapter
pub struct LibavMediaAdapter {
    analysis_width: u32,
    sample_rate: u32,
}

impl LibavMediaAdapter {
    /// Create new LibAV media adapter
    pub fn new(analysis_width: u32, sample_rate: u32) -> Result<Self, DomainError> {
        ffmpeg_next::init()
            .map_err(|e| DomainError::InternalError(format!("FFmpeg initialization failed: {}", e)))?;
        Ok(Self {
            analysis_width,
            sample_rate,
        })
    }
}

fn unreadable(path: &Path, what: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::SourceUnreadable(format!("{}: {} ({})", path.display(), what, err))
}

fn open_input(path: &Path) -> Result<format::context::Input, DomainError> {
    if !path.exists() {
        return Err(DomainError::SourceUnreadable(format!(
            "Input file does not exist: {}",
            path.display()
        )));
    }
    format::input(&path).map_err(|e| unreadable(path, "failed to open input", e))
}

/// Even dimensions no wider than `max_width`, preserving aspect ratio
fn analysis_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let target_width = width.min(max_width).max(2) & !1;
    let target_height = ((height as u64 * target_width as u64) / width as u64).max(2) as u32 & !1;
    (target_width, target_height.max(2))
}

impl MediaPort for LibavMediaAdapter {
    fn open_video(&self, path: &Path) -> Result<Arc<dyn VideoSource>, DomainError> {
        let ictx = open_input(path)?;
        let stream = ictx
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| DomainError::SourceUnreadable(format!("{}: no video stream", path.display())))?;

        let stream_index = stream.index();
        let time_base = f64::from(stream.time_base());
        let mut fps = f64::from(stream.avg_frame_rate());
        if !fps.is_finite() || fps <= 0.0 {
            fps = f64::from(stream.rate());
        }
        if !fps.is_finite() || fps <= 0.0 {
            fps = 0.0;
        }

        let duration = if stream.duration() > 0 {
            stream.duration() as f64 * time_base
        } else if ictx.duration() > 0 {
            ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        let decoder = codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unreadable(path, "failed to create codec context", e))?
            .decoder()
            .video()
            .map_err(|e| unreadable(path, "failed to create video decoder", e))?;

        let info = VideoInfo {
            fps,
            duration,
            width: decoder.width(),
            height: decoder.height(),
        };
        let (analysis_width, analysis_height) =
            analysis_size(info.width, info.height, self.analysis_width);

        info!(
            path = %path.display(),
            fps = info.fps,
            duration = info.duration,
            width = info.width,
            height = info.height,
            analysis_width,
            analysis_height,
            "Video stream opened"
        );

        Ok(Arc::new(LibavVideoSource {
            path: path.to_path_buf(),
            stream_index,
            info,
            analysis_width,
            analysis_height,
        }))
    }

    fn open_audio(&self, path: &Path) -> Result<Option<AudioTrack>, DomainError> {
        let mut ictx = open_input(path)?;
        let Some(stream) = ictx.streams().best(media::Type::Audio) else {
            return Ok(None);
        };
        let stream_index = stream.index();

        let mut decoder = codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unreadable(path, "failed to create codec context", e))?
            .decoder()
            .audio()
            .map_err(|e| unreadable(path, "failed to create audio decoder", e))?;

        let mut mixer = MonoDownmixer::new(decoder.rate(), self.sample_rate);
        let mut decoded = frame::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                warn!(error = %e, "Skipping undecodable audio packet");
                continue;
            }
            while decoder.receive_frame(&mut decoded).is_ok() {
                mixer.push(&decoded);
            }
        }

        decoder
            .send_eof()
            .map_err(|e| unreadable(path, "failed to flush audio decoder", e))?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            mixer.push(&decoded);
        }

        let track = mixer.finish();
        debug!(
            samples = track.samples().len(),
            sample_rate = track.sample_rate(),
            duration = track.duration(),
            "Audio track decoded"
        );
        Ok(Some(track))
    }
}

/// Downmixes decoded audio frames to mono i16 at a reduced rate
struct MonoDownmixer {
    /// Source samples per output sample
    step: f64,
    next_pick: f64,
    consumed: u64,
    output_rate: u32,
    samples: Vec<i16>,
}

impl MonoDownmixer {
    fn new(source_rate: u32, output_rate: u32) -> Self {
        let source_rate = if source_rate == 0 { output_rate } else { source_rate };
        Self {
            step: source_rate as f64 / output_rate.max(1) as f64,
            next_pick: 0.0,
            consumed: 0,
            output_rate,
            samples: Vec::new(),
        }
    }

    fn push(&mut self, frame: &frame::Audio) {
        let channels = (frame.channels() as usize).max(1);
        let count = frame.samples();
        let format = frame.format();
        let bytes = bytes_per_sample(format);
        if bytes == 0 {
            return;
        }

        for i in 0..count {
            let mut sum = 0.0f32;
            for ch in 0..channels {
                let (plane, offset) = match format {
                    Sample::U8(SampleLayout::Planar)
                    | Sample::I16(SampleLayout::Planar)
                    | Sample::I32(SampleLayout::Planar)
                    | Sample::I64(SampleLayout::Planar)
                    | Sample::F32(SampleLayout::Planar)
                    | Sample::F64(SampleLayout::Planar) => (ch, i * bytes),
                    _ => (0, (i * channels + ch) * bytes),
                };
                if plane >= frame.planes() {
                    continue;
                }
                let data = frame.data(plane);
                if let Some(raw) = data.get(offset..offset + bytes) {
                    sum += decode_sample(raw, format);
                }
            }
            let mono = sum / channels as f32;

            while self.consumed as f64 >= self.next_pick {
                self.samples.push((mono * i16::MAX as f32).round().clamp(-32768.0, 32767.0) as i16);
                self.next_pick += self.step;
            }
            self.consumed += 1;
        }
    }

    fn finish(self) -> AudioTrack {
        AudioTrack::new(self.samples, self.output_rate)
    }
}

fn bytes_per_sample(format: Sample) -> usize {
    match format {
        Sample::U8(_) => 1,
        Sample::I16(_) => 2,
        Sample::I32(_) | Sample::F32(_) => 4,
        Sample::I64(_) | Sample::F64(_) => 8,
        Sample::None => 0,
    }
}

/// One sample normalized to [-1, 1]
fn decode_sample(raw: &[u8], format: Sample) -> f32 {
    match format {
        Sample::U8(_) => (raw[0] as f32 - 128.0) / 128.0,
        Sample::I16(_) => i16::from_ne_bytes([raw[0], raw[1]]) as f32 / 32768.0,
        Sample::I32(_) => i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 / 2_147_483_648.0,
        Sample::I64(_) => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[..8]);
            (i64::from_ne_bytes(b) as f64 / 9_223_372_036_854_775_808.0) as f32
        }
        Sample::F32(_) => f32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]),
        Sample::F64(_) => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[..8]);
            f64::from_ne_bytes(b) as f32
        }
        Sample::None => 0.0,
    }
}

/// Video stream of one file; every cursor reopens the file
pub struct LibavVideoSource {
    path: PathBuf,
    stream_index: usize,
    info: VideoInfo,
    analysis_width: u32,
    analysis_height: u32,
}

impl VideoSource for LibavVideoSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn cursor(&self) -> Result<Box<dyn FrameCursor>, DomainError> {
        let ictx = open_input(&self.path)?;
        let stream = ictx.stream(self.stream_index).ok_or_else(|| {
            DomainError::SourceUnreadable(format!(
                "{}: stream {} disappeared",
                self.path.display(),
                self.stream_index
            ))
        })?;
        let time_base = f64::from(stream.time_base());
        let decoder = codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unreadable(&self.path, "failed to create codec context", e))?
            .decoder()
            .video()
            .map_err(|e| unreadable(&self.path, "failed to create video decoder", e))?;

        Ok(Box::new(LibavFrameCursor {
            ictx,
            decoder,
            stream_index: self.stream_index,
            time_base,
            frame_interval: self.info.frame_duration(),
            out_width: self.analysis_width,
            out_height: self.analysis_height,
            scaler: None,
            draining: false,
            last_timestamp: None,
            seek_target: None,
        }))
    }
}

/// Sequential decoder over one video stream
pub struct LibavFrameCursor {
    ictx: format::context::Input,
    decoder: decoder::Video,
    stream_index: usize,
    time_base: f64,
    frame_interval: f64,
    out_width: u32,
    out_height: u32,
    scaler: Option<scaling::Context>,
    draining: bool,
    last_timestamp: Option<f64>,
    seek_target: Option<f64>,
}

impl LibavFrameCursor {
    /// Read packets until one was sent to the decoder or input ended
    fn feed(&mut self) -> Result<(), DomainError> {
        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        warn!(error = %e, "Skipping undecodable video packet");
                        continue;
                    }
                    return Ok(());
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.decoder.send_eof().map_err(|e| {
                        DomainError::SourceUnreadable(format!("failed to flush video decoder: {}", e))
                    })?;
                    self.draining = true;
                    return Ok(());
                }
                Err(e) => {
                    return Err(DomainError::SourceUnreadable(format!(
                        "failed to read packet: {}",
                        e
                    )))
                }
            }
        }
    }

    /// Next decoded frame with its timestamp in seconds
    fn decode_raw(&mut self) -> Result<Option<(f64, frame::Video)>, DomainError> {
        loop {
            let mut decoded = frame::Video::empty();
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let timestamp = match decoded.timestamp().or(decoded.pts()) {
                        Some(ts) => ts as f64 * self.time_base,
                        None => self
                            .last_timestamp
                            .map(|t| t + self.frame_interval)
                            .unwrap_or(0.0),
                    };
                    self.last_timestamp = Some(timestamp);

                    if let Some(target) = self.seek_target {
                        if timestamp + 1e-6 < target {
                            continue;
                        }
                        self.seek_target = None;
                    }
                    return Ok(Some((timestamp.max(0.0), decoded)));
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(_) if self.draining => return Ok(None),
                Err(_) => self.feed()?,
            }
        }
    }

    fn convert(&mut self, timestamp: f64, decoded: &frame::Video) -> Result<VideoFrame, DomainError> {
        if self.scaler.is_none() {
            let scaler = scaling::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                format::Pixel::RGB24,
                self.out_width,
                self.out_height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| DomainError::SourceUnreadable(format!("failed to create scaler: {}", e)))?;
            self.scaler = Some(scaler);
        }

        let mut rgb = frame::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler
                .run(decoded, &mut rgb)
                .map_err(|e| DomainError::SourceUnreadable(format!("failed to scale frame: {}", e)))?;
        }

        let width = rgb.width() as usize;
        let height = rgb.height() as usize;
        let stride = rgb.stride(0);
        let data = rgb.data(0);
        let mut packed = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let row = y * stride;
            packed.extend_from_slice(&data[row..row + width * 3]);
        }

        VideoFrame::from_rgb(timestamp, width as u32, height as u32, packed)
    }
}

impl FrameCursor for LibavFrameCursor {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, DomainError> {
        match self.decode_raw()? {
            Some((timestamp, decoded)) => self.convert(timestamp, &decoded).map(Some),
            None => Ok(None),
        }
    }

    fn skip_frames(&mut self, count: usize) -> Result<usize, DomainError> {
        for skipped in 0..count {
            if self.decode_raw()?.is_none() {
                return Ok(skipped);
            }
        }
        Ok(count)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DomainError> {
        let target = seconds.max(0.0);
        let ts = (target * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        self.ictx
            .seek(ts, ..ts)
            .map_err(|e| DomainError::SourceUnreadable(format!("failed to seek to {:.3}s: {}", target, e)))?;
        self.decoder.flush();
        self.draining = false;
        self.last_timestamp = None;
        self.seek_target = Some(target);
        Ok(())
    }
}
