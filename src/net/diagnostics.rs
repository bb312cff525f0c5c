//! Inbound throughput measurement for the diagnostic overlay.

use std::fmt;
use std::time::Instant;

/// Rolling measurement of binary-message rate and bandwidth, derived from
/// payload size and inter-arrival time.
pub struct ThroughputMeter {
    last_arrival: Option<Instant>,
}

/// One measurement, ready for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputSample {
    pub bytes: usize,
    /// Inferred messages per second (rounded); 0 for the first message
    pub fps: u32,
    /// Bandwidth estimate in megabits per second (rounded)
    pub mbps: u32,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self { last_arrival: None }
    }

    /// Record an arrival now
    pub fn record(&mut self, bytes: usize) -> ThroughputSample {
        self.record_at(bytes, Instant::now())
    }

    /// Record an arrival at an explicit timestamp (injectable for tests)
    pub fn record_at(&mut self, bytes: usize, now: Instant) -> ThroughputSample {
        let fps = match self.last_arrival {
            Some(last) => {
                let dt = now.duration_since(last).as_secs_f64();
                if dt > 0.0 {
                    (1.0 / dt).round() as u32
                } else {
                    0
                }
            }
            None => 0,
        };
        self.last_arrival = Some(now);

        let mbps = ((bytes as f64 * 8.0 * f64::from(fps)) / 1024.0 / 1024.0).round() as u32;

        ThroughputSample { bytes, fps, mbps }
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThroughputSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received arraybuffer of {} bytes at {} fps, which is {} mbps",
            self.bytes, self.fps, self.mbps
        )
    }
}
