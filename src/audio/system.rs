//! Audio system managing synthesis, playback gating, and analysis.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

use super::fft::spawn_analysis_thread;
use super::synthesis::GLICOL_COMPOSITION;
use super::AudioControl;
use crate::error::{Error, Result};
use crate::params::{audio_constants::BLOCK_SIZE, AnalyzerConfig, VolumePolicy};

/// Audio system: a synthesized looping track behind the gesture latch,
/// plus the frequency analyzer feeding the frame loop.
pub struct AudioSystem {
    /// Shared playback control (latch + volume), mutated by clicks
    control: Arc<Mutex<AudioControl>>,

    /// Latest average-frequency sample on the 0..255 byte scale
    average_frequency: Arc<Mutex<f32>>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Analysis thread handle (kept for lifetime)
    _analysis_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start the audio system. The stream runs immediately but
    /// outputs silence until the control latch fires.
    pub fn new(analyzer_config: AnalyzerConfig, volume_policy: VolumePolicy) -> Result<Self> {
        analyzer_config.validate().map_err(Error::Analyzer)?;

        // Create Glicol engine
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(analyzer_config.sample_rate_hz);
        engine.update_with_code(GLICOL_COMPOSITION);
        engine
            .update()
            .map_err(|e| Error::Synth(format!("{e:?}")))?;

        // Shared state between audio callback, analysis thread, and the
        // interaction layer
        let engine = Arc::new(Mutex::new(engine));
        let engine_clone = Arc::clone(&engine);

        let sample_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sample_buffer_clone = Arc::clone(&sample_buffer);

        let control = Arc::new(Mutex::new(AudioControl::new(volume_policy)));
        let control_clone = Arc::clone(&control);

        let average_frequency = Arc::new(Mutex::new(0.0f32));

        // Setup audio output device
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoAudioDevice)?;
        let config = device.default_output_config()?;

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = config.sample_rate().0,
            "audio output ready"
        );

        // Build audio output stream
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let (started, volume) = {
                    let control = control_clone.lock().unwrap();
                    (control.is_started(), control.volume())
                };

                // Before the gesture latch fires there is nothing to play;
                // the analyzer sees the same silence the speakers do.
                if !started {
                    data.fill(0.0);
                    let mut samples = sample_buffer_clone.lock().unwrap();
                    samples.extend(std::iter::repeat(0.0).take(data.len() / 2));
                    return;
                }

                let mut engine = engine_clone.lock().unwrap();
                let mut samples = sample_buffer_clone.lock().unwrap();

                let frames_needed = data.len() / 2; // Stereo frames
                let mut frame_idx = 0;

                // Generate multiple blocks if needed to fill the entire buffer
                while frame_idx < frames_needed {
                    let (buffers, _) = engine.next_block(vec![]);

                    let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                    for i in 0..samples_to_copy {
                        // Volume runs 0..20, so the hard clip at ±0.5 is the
                        // safety limiter; distortion at high volume is part
                        // of the act
                        let left = (buffers[0][i] * volume).clamp(-0.5, 0.5);
                        let right = (buffers[1][i] * volume).clamp(-0.5, 0.5);

                        let out_idx = (frame_idx + i) * 2;
                        data[out_idx] = left;
                        data[out_idx + 1] = right;

                        samples.push(left); // Accumulate for analysis
                    }

                    frame_idx += samples_to_copy;
                }
            },
            |err| warn!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;

        // Start the analysis thread
        let analysis_thread = spawn_analysis_thread(
            analyzer_config,
            sample_buffer,
            Arc::clone(&average_frequency),
        );

        Ok(Self {
            control,
            average_frequency,
            _stream: stream,
            _analysis_thread: Some(analysis_thread),
        })
    }

    /// Shared playback control handle
    pub fn control(&self) -> Arc<Mutex<AudioControl>> {
        Arc::clone(&self.control)
    }

    /// Latest average-frequency sample (0..255 byte scale). Consumed once
    /// per frame; never cached by the caller.
    pub fn average_frequency(&self) -> f32 {
        *self.average_frequency.lock().unwrap()
    }
}
