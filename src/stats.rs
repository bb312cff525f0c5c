//! Frame performance measurement bracketing each frame.

use std::time::{Duration, Instant};

use tracing::debug;

/// Rolling FPS / frame-time monitor. `begin` and `end` bracket every frame;
/// a summary is emitted through the logger once per report interval.
pub struct FrameStats {
    frame_start: Option<Instant>,
    frames: u32,
    busy: Duration,
    window_start: Instant,
    report_interval: Duration,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_start: None,
            frames: 0,
            busy: Duration::ZERO,
            window_start: Instant::now(),
            report_interval: Duration::from_secs(1),
        }
    }

    pub fn begin(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    pub fn end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        self.busy += start.elapsed();
        self.frames += 1;

        let window = self.window_start.elapsed();
        if window >= self.report_interval {
            let fps = self.frames as f64 / window.as_secs_f64();
            let avg_ms = self.busy.as_secs_f64() * 1000.0 / f64::from(self.frames);
            debug!(fps = format!("{fps:.0}"), frame_ms = format!("{avg_ms:.2}"), "frame stats");

            self.frames = 0;
            self.busy = Duration::ZERO;
            self.window_start = Instant::now();
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_without_begin_is_harmless() {
        let mut stats = FrameStats::new();
        stats.end();
        assert_eq!(stats.frames, 0);
    }

    #[test]
    fn test_frames_accumulate() {
        let mut stats = FrameStats::new();
        for _ in 0..3 {
            stats.begin();
            stats.end();
        }
        assert_eq!(stats.frames, 3);
    }
}
