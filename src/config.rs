// src/config.rs

/// Frames per render quantum.
pub const QUANTUM_FRAMES: usize = 128;

/// Default stream sample rate.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Configuration shared by the control side and the render side of a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Stream sample rate in Hz. Ticks count samples at this rate.
    pub sample_rate: f64,

    /// Stop driving the renderer once it reports finished.
    pub teardown_on_finish: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            teardown_on_finish: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_teardown_on_finish(mut self, teardown: bool) -> Self {
        self.teardown_on_finish = teardown;
        self
    }
}
