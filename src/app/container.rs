use std::sync::Arc;

use crate::adapters::{LibavMediaAdapter, LibavRenderAdapter, SilentTranscriber, WhisperHttpAdapter};
use crate::app::{scenes_interactor::ScenesInteractor, summarize_interactor::SummarizeInteractor};
use crate::config::DistillConfig;
use crate::domain::errors::DomainError;
use crate::ports::{MediaPort, RenderPort, TranscriptionPort};

pub trait AppContainer: Send + Sync {
    fn summarize_interactor(&self) -> Arc<SummarizeInteractor>;
    fn scenes_interactor(&self) -> Arc<ScenesInteractor>;
}

pub struct DefaultAppContainer {
    summarize_interactor: Arc<SummarizeInteractor>,
    scenes_interactor: Arc<ScenesInteractor>,
}

impl DefaultAppContainer {
    /// Wire the libav and HTTP adapters from a validated configuration
    pub fn new(config: DistillConfig) -> Result<Self, DomainError> {
        let media_port = Arc::new(LibavMediaAdapter::new(
            config.detection.analysis_width,
            config.audio.sample_rate,
        )?);
        let render_port = Arc::new(LibavRenderAdapter::new(config.pipeline.overwrite)?);
        let transcription_port: Arc<dyn TranscriptionPort> = if config.transcription.enabled {
            Arc::new(WhisperHttpAdapter::new(&config.transcription)?)
        } else {
            Arc::new(SilentTranscriber)
        };

        Ok(Self::with_ports(
            config,
            media_port as Arc<dyn MediaPort>,
            transcription_port,
            render_port as Arc<dyn RenderPort>,
        ))
    }

    /// Wire the interactors around explicit ports
    pub fn with_ports(
        config: DistillConfig,
        media_port: Arc<dyn MediaPort>,
        transcription_port: Arc<dyn TranscriptionPort>,
        render_port: Arc<dyn RenderPort>,
    ) -> Self {
        let scenes_interactor = Arc::new(ScenesInteractor::new(
            Arc::clone(&media_port),
            Arc::clone(&render_port),
            config.detection.clone(),
        ));

        let summarize_interactor = Arc::new(SummarizeInteractor::new(
            media_port,
            transcription_port,
            render_port,
            config,
        ));

        Self {
            summarize_interactor,
            scenes_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn summarize_interactor(&self) -> Arc<SummarizeInteractor> {
        Arc::clone(&self.summarize_interactor)
    }

    fn scenes_interactor(&self) -> Arc<ScenesInteractor> {
        Arc::clone(&self.scenes_interactor)
    }
}
