//! Parameter definitions with documented units and semantics.
//!
//! All magic numbers live here with:
//! - Units (meters, radians, Hz, milliseconds)
//! - Documented ranges and meanings
//! - `Default` impls matching the shared-room deployment

/// Capacity of the participant instance pool. Rosters longer than this are
/// truncated; slots beyond the active count are never drawn.
pub const MAX_INSTANCES: usize = 100;

/// Static placement of every object in the room.
///
/// Positions are world-space meters; Y is up, the camera looks down -Z.
#[derive(Debug, Clone)]
pub struct SceneLayout {
    /// Center of the clickable unit sphere
    pub sphere_target_center: [f32; 3],

    /// Radius of the clickable sphere (also its pick radius)
    pub sphere_target_radius: f32,

    /// Center of the clickable torus
    pub torus_target_center: [f32; 3],

    /// Torus major radius (center of tube to center of torus)
    pub torus_major_radius: f32,

    /// Torus minor radius (tube thickness)
    pub torus_minor_radius: f32,

    /// Position of the audio-reactive solid cube
    pub cube_position: [f32; 3],

    /// Position of the audio-reactive wireframe cube
    pub line_position: [f32; 3],

    /// Radius of one participant sphere in the instance pool
    pub participant_radius: f32,

    /// Side length of the ground grid helper (meters)
    pub grid_extent: f32,

    /// Number of grid divisions per side
    pub grid_divisions: usize,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            sphere_target_center: [-2.0, 1.5, 0.0],
            sphere_target_radius: 1.0,
            torus_target_center: [2.0, 1.5, 0.0],
            torus_major_radius: 1.0,
            torus_minor_radius: 0.4,
            cube_position: [2.5, 5.0, -5.0],
            line_position: [-2.5, 5.0, -5.0],
            participant_radius: 0.1,
            grid_extent: 10.0,
            grid_divisions: 10,
        }
    }
}

impl SceneLayout {
    /// Pick radius of the torus: bounding sphere around the whole ring.
    pub fn torus_pick_radius(&self) -> f32 {
        self.torus_major_radius + self.torus_minor_radius
    }
}

/// Spectral analysis configuration for the frequency analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size in samples (must be a power of 2).
    /// 64 samples → 32 magnitude bins, a deliberately short window: the
    /// consumer wants one coarse energy scalar per frame, not a spectrogram.
    pub fft_size: usize,

    /// Analysis update interval (milliseconds)
    pub update_interval_ms: u64,

    /// Gain applied when normalizing mean bin magnitude onto the 0..255
    /// byte scale the visual mapping divides by 128. Calibrated so the
    /// built-in composition lands mid-range at unit volume.
    pub byte_gain: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 64,
            update_interval_ms: 50,
            byte_gain: 400.0,
        }
    }
}

impl AnalyzerConfig {
    /// Number of usable magnitude bins (half the FFT window)
    pub fn bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        Ok(())
    }
}

/// Playback volume policy.
///
/// The volume is one global field shared by both clickable targets: the
/// sphere raises it, the torus lowers it. That coupling is product intent,
/// so there is exactly one owner and two mutators.
#[derive(Debug, Clone)]
pub struct VolumePolicy {
    /// Volume at startup (dimensionless gain)
    pub initial: f32,

    /// Step applied per qualifying click
    pub step: f32,

    /// Upper clamp (inclusive)
    pub max: f32,

    /// Lower clamp (inclusive)
    pub min: f32,
}

impl Default for VolumePolicy {
    fn default() -> Self {
        Self {
            initial: 1.0,
            step: 1.5,
            max: 20.0,
            min: 0.0,
        }
    }
}

/// Mapping from audio analysis to visual parameters
#[derive(Debug, Clone)]
pub struct ReactiveMapping {
    /// Divisor normalizing the 0..255 average frequency before scaling.
    /// Formula: scale = (avg_freq / this) * volume * gain
    pub freq_divisor: f32,

    /// Gain applied after volume multiplication
    pub scale_gain: f32,

    /// Wireframe cube spin per frame (radians). Applied per frame, not per
    /// second: the rotation rate tracks the display refresh on purpose.
    pub rotation_step: f32,
}

impl Default for ReactiveMapping {
    fn default() -> Self {
        Self {
            freq_divisor: 128.0,
            scale_gain: 5.0,
            rotation_step: 0.01,
        }
    }
}

impl ReactiveMapping {
    /// Visual scale for the reactive cube/line. Pure function of the two
    /// continuously varying inputs, recomputed every frame with no smoothing.
    pub fn reactive_scale(&self, avg_freq: f32, volume: f32) -> f32 {
        (avg_freq / self.freq_divisor) * volume * self.scale_gain
    }
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// HTTP(S) origin of the hosting server; the socket endpoint is derived
    /// by scheme substitution (http → ws, https → wss)
    pub origin: String,

    /// Delay before the full restart after the socket closes (milliseconds).
    /// Blunt recovery on purpose: no backoff, no in-place reconnect.
    pub reload_delay_ms: u64,

    /// Worker poll interval while the socket is open (milliseconds)
    pub poll_interval_ms: u64,

    /// Whether parsed JSON rosters are applied to the instance pool.
    /// The binary path never feeds the scene; see DESIGN.md for the
    /// upstream discrepancy this flag preserves.
    pub apply_roster: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            reload_delay_ms: 2000,
            poll_interval_ms: 5,
            apply_roster: true,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters); anything closer than 5 cm is skipped
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Camera eye position: average human eye height, a few meters back
    pub eye_position: [f32; 3],

    /// Point the camera looks at
    pub look_target: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane_m: 0.05,
            far_plane_m: 100.0,
            eye_position: [0.0, 1.5, 4.0],
            look_target: [0.0, 1.5, 0.0],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_config_bins() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.bins(), 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyzer_config_rejects_non_power_of_two() {
        let config = AnalyzerConfig {
            fft_size: 48,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reactive_scale_formula() {
        let mapping = ReactiveMapping::default();

        // avg 128 normalizes to 1.0; unit volume and gain 5 give scale 5
        assert_eq!(mapping.reactive_scale(128.0, 1.0), 5.0);

        // Silence collapses the scale regardless of volume
        assert_eq!(mapping.reactive_scale(0.0, 20.0), 0.0);

        // Scale is linear in both inputs
        assert_eq!(mapping.reactive_scale(64.0, 2.0), 5.0);
    }

    #[test]
    fn test_torus_pick_radius() {
        let layout = SceneLayout::default();
        assert_eq!(layout.torus_pick_radius(), 1.4);
    }
}
