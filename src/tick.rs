// src/tick.rs

use crate::config::QUANTUM_FRAMES;

/// Absolute stream position in samples since the stream began.
pub type Tick = u64;

/// Reserved tick meaning "no stop scheduled".
pub const TICK_UNBOUNDED: Tick = u64::MAX;

/// Quantum length in ticks.
pub const QUANTUM_TICKS: Tick = QUANTUM_FRAMES as Tick;

//
// ===============================
// MARK: Time base
// ===============================
//

/// Converts control-side seconds into sample-domain ticks.
///
/// This struct:
/// - is copyable
/// - is only used on the control side
/// - rounds to the nearest sample (half away from zero)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeBase {
    sample_rate: f64,
}

impl TimeBase {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate }
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Seconds to ticks. Negative input clamps to 0, huge input saturates.
    #[inline]
    pub fn seconds_to_ticks(&self, seconds: f64) -> Tick {
        if seconds <= 0.0 {
            return 0;
        }
        // `as` saturates for out-of-range floats.
        (seconds * self.sample_rate).round() as Tick
    }

    /// Ticks back to seconds (for readback display).
    #[inline]
    pub fn ticks_to_seconds(&self, ticks: Tick) -> f64 {
        ticks as f64 / self.sample_rate
    }
}
