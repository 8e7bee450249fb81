// Adapters - External system implementations

pub mod libav_media;
pub mod libav_render;
pub mod memory;
pub mod silent_transcriber;
pub mod toml_config;
pub mod whisper_http;

// Re-export adapters
pub use libav_media::LibavMediaAdapter;
pub use libav_render::LibavRenderAdapter;
pub use memory::{MemoryFrameCursor, MemoryMediaAdapter, MemoryVideoSource};
pub use silent_transcriber::SilentTranscriber;
pub use toml_config::TomlConfigAdapter;
pub use whisper_http::WhisperHttpAdapter;
