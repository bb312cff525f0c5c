//! Audio synthesis, playback control, and spectral analysis.

mod fft;
mod synthesis;
mod system;

pub use fft::spawn_analysis_thread;
pub use system::AudioSystem;

use crate::params::VolumePolicy;

/// Playback control shared between the interaction layer and the audio
/// callback: the global volume and the one-shot start latch.
#[derive(Debug, Clone)]
pub struct AudioControl {
    volume: f32,
    started: bool,
    policy: VolumePolicy,
}

impl AudioControl {
    pub fn new(policy: VolumePolicy) -> Self {
        Self {
            volume: policy.initial.clamp(policy.min, policy.max),
            started: false,
            policy,
        }
    }

    /// Current playback volume, always within policy bounds
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Raise by one step, clamped to the upper bound
    pub fn raise_volume(&mut self) {
        self.volume = (self.volume + self.policy.step).min(self.policy.max);
    }

    /// Lower by one step, clamped to the lower bound
    pub fn lower_volume(&mut self) {
        self.volume = (self.volume - self.policy.step).max(self.policy.min);
    }

    /// Edge-triggered start latch: returns true only on the transition.
    /// Browsers require a user gesture before playback; the same discipline
    /// is kept here so the first click starts the music exactly once.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}
