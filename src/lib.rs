//! Glowroom library - audio-reactive shared-presence room client

pub mod audio;
pub mod camera;
pub mod cli;
pub mod error;
pub mod interaction;
pub mod net;
pub mod params;
pub mod presence;
pub mod rendering;
pub mod scene;
pub mod stats;
