//! Error types for fallible initialization paths.
//!
//! Runtime failures (socket drops, malformed payloads, surface loss) are
//! deliberately NOT represented here: the frame loop degrades those to a
//! log line and keeps rendering.

use thiserror::Error;

/// Initialization errors: anything that can stop the client before the
/// frame loop starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create render surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("no audio output device found")]
    NoAudioDevice,

    #[error("failed to query audio output config: {0}")]
    AudioConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("synth engine init failed: {0}")]
    Synth(String),

    #[error("invalid analyzer config: {0}")]
    Analyzer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
