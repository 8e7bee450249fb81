//! Decoded mono audio and per-scene slices

use std::io::Cursor;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::domain::errors::DomainError;
use crate::domain::model::Scene;

/// Mono 16-bit PCM track decoded once per run and shared read-only
#[derive(Debug, Clone)]
pub struct AudioTrack {
    samples: Arc<[i16]>,
    sample_rate: u32,
}

impl AudioTrack {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Track used when the source has no audio stream
    pub fn silent(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Slice `[start_ms, end_ms)`, clamped to the track
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioClip<'_> {
        let rate = self.sample_rate as u64;
        let len = self.samples.len();
        let start = ((start_ms * rate / 1000) as usize).min(len);
        let end = ((end_ms * rate / 1000) as usize).clamp(start, len);
        AudioClip {
            samples: &self.samples[start..end],
            sample_rate: self.sample_rate,
        }
    }

    pub fn slice(&self, scene: &Scene) -> AudioClip<'_> {
        self.slice_ms(scene.start_ms(), scene.end_ms())
    }
}

/// Borrowed slice of an [`AudioTrack`]
#[derive(Debug, Clone, Copy)]
pub struct AudioClip<'a> {
    samples: &'a [i16],
    sample_rate: u32,
}

impl<'a> AudioClip<'a> {
    pub fn new(samples: &'a [i16], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &'a [i16] {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }

    /// Root mean square of the raw sample values, 0 for an empty clip
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let v = s as f64;
                v * v
            })
            .sum();
        (sum_squares / self.samples.len() as f64).sqrt()
    }

    /// Encode as a mono 16-bit WAV file in memory
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, DomainError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buffer, spec).map_err(wav_error)?;
            for &sample in self.samples {
                writer.write_sample(sample).map_err(wav_error)?;
            }
            writer.finalize().map_err(wav_error)?;
        }
        Ok(buffer.into_inner())
    }
}

fn wav_error(err: hound::Error) -> DomainError {
    DomainError::FeatureAggregationFailure(format!("WAV encoding failed: {}", err))
}
