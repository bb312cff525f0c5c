//! Analysis thread: short-window FFT reduced to one average-frequency
//! scalar on a 0..255 byte scale.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::AnalyzerConfig;

/// Spawn the analysis thread. It drains the shared sample buffer, runs a
/// Hann-windowed FFT with 50% overlap, and publishes the mean bin magnitude
/// normalized onto the byte scale the visual mapping expects.
pub fn spawn_analysis_thread(
    config: AnalyzerConfig,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    average_frequency: Arc<Mutex<f32>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_input = vec![Complex::new(0.0, 0.0); config.fft_size];
        let mut fft_output = vec![Complex::new(0.0, 0.0); config.fft_size];

        loop {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let mut samples = sample_buffer.lock().unwrap();

            // The callback produces samples much faster than one window per
            // tick; keep only the newest window so the analysis tracks the
            // live signal instead of an ever-growing backlog.
            trim_to_latest_window(&mut samples, config.fft_size);

            if samples.len() >= config.fft_size {
                // Apply Hann window
                for i in 0..config.fft_size {
                    let window = hann_window(i, config.fft_size);
                    fft_input[i] = Complex::new(samples[i] * window, 0.0);
                }

                // Perform FFT
                fft_output.copy_from_slice(&fft_input);
                fft.process(&mut fft_output);

                let avg = byte_scale_average(&fft_output, config.bins(), config.byte_gain);
                *average_frequency.lock().unwrap() = avg;

                // 50% overlap (drain half the window)
                samples.drain(0..config.fft_size / 2);
            }
        }
    })
}

/// Discard everything but the newest `window` samples
fn trim_to_latest_window(samples: &mut Vec<f32>, window: usize) {
    if samples.len() > window {
        let excess = samples.len() - window;
        samples.drain(0..excess);
    }
}

/// Mean magnitude over the first `bins` spectrum entries, scaled by `gain`
/// and clamped to the 0..255 byte range.
pub fn byte_scale_average(spectrum: &[Complex<f32>], bins: usize, gain: f32) -> f32 {
    if bins == 0 {
        return 0.0;
    }
    let mean: f32 = spectrum[..bins].iter().map(|c| c.norm()).sum::<f32>() / bins as f32;
    (mean * gain).clamp(0.0, 255.0)
}

/// Hann window function for FFT analysis
fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 64;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_byte_scale_average_of_silence_is_zero() {
        let spectrum = vec![Complex::new(0.0, 0.0); 64];
        assert_eq!(byte_scale_average(&spectrum, 32, 400.0), 0.0);
    }

    #[test]
    fn test_byte_scale_average_clamps_to_byte_range() {
        let spectrum = vec![Complex::new(100.0, 0.0); 64];
        assert_eq!(byte_scale_average(&spectrum, 32, 400.0), 255.0);
    }

    #[test]
    fn test_byte_scale_average_is_monotonic_in_energy() {
        let quiet = vec![Complex::new(0.01, 0.0); 64];
        let loud = vec![Complex::new(0.1, 0.0); 64];

        let a = byte_scale_average(&quiet, 32, 400.0);
        let b = byte_scale_average(&loud, 32, 400.0);
        assert!(b > a);
        assert!(a > 0.0);
    }

    #[test]
    fn test_trim_keeps_only_the_newest_samples() {
        // A second of loud signal followed by a fresh window of silence:
        // after trimming, only the silence remains to be analyzed
        let mut samples = vec![1.0f32; 44100];
        samples.extend(std::iter::repeat(0.0).take(64));

        trim_to_latest_window(&mut samples, 64);
        assert_eq!(samples.len(), 64);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_trim_leaves_short_buffers_alone() {
        let mut samples = vec![0.5f32; 40];
        trim_to_latest_window(&mut samples, 64);
        assert_eq!(samples.len(), 40);
    }

    #[test]
    fn test_byte_scale_average_only_reads_requested_bins() {
        // Energy above the window must not leak into the average
        let mut spectrum = vec![Complex::new(0.0, 0.0); 64];
        for bin in spectrum.iter_mut().skip(32) {
            *bin = Complex::new(100.0, 0.0);
        }
        assert_eq!(byte_scale_average(&spectrum, 32, 400.0), 0.0);
    }
}
