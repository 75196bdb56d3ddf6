// src/source_node.rs
//
// Control-side buffer source.
//
// Takes user-facing times in seconds, validates and clamps them, converts
// them to ticks and sample counts, and publishes the result through the
// parameter channel. The renderer trusts whatever arrives here.

use std::sync::Arc;

use log::{debug, warn};

use crate::bridge::SharedReadback;
use crate::config::EngineConfig;
use crate::error::{SourceError, SourceResult};
use crate::parameter::{ParamChannel, StartParams};
use crate::source_buffer::SourceBuffer;
use crate::tick::{Tick, TimeBase};

/// Control handle for one buffer source.
///
/// Not real-time safe. Never touch it from the audio thread.
pub struct BufferSourceNode {
    config: EngineConfig,
    time_base: TimeBase,

    /// Channel to the renderer.
    params: Arc<ParamChannel>,

    /// Shared readback (written by the renderer).
    readback: Arc<SharedReadback>,

    /// Buffer handed to the renderer on `start`.
    buffer: Option<Arc<SourceBuffer>>,

    looping: bool,
    /// Loop region in seconds; (0, 0) means the whole buffer.
    loop_start: f64,
    loop_end: f64,

    start_called: bool,
}

impl BufferSourceNode {
    pub(crate) fn new(
        config: EngineConfig,
        params: Arc<ParamChannel>,
        readback: Arc<SharedReadback>,
    ) -> Self {
        Self {
            config,
            time_base: TimeBase::new(config.sample_rate),
            params,
            readback,
            buffer: None,
            looping: false,
            loop_start: 0.0,
            loop_end: 0.0,
            start_called: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -------------------------------
    // MARK: Attributes
    // -------------------------------

    /// Set the source. Only the buffer present at `start` is played.
    pub fn set_buffer(&mut self, buffer: Option<Arc<SourceBuffer>>) {
        self.buffer = buffer;
    }

    pub fn buffer(&self) -> Option<&Arc<SourceBuffer>> {
        self.buffer.as_ref()
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop_start(&mut self, seconds: f64) {
        self.loop_start = seconds;
    }

    pub fn loop_start(&self) -> f64 {
        self.loop_start
    }

    pub fn set_loop_end(&mut self, seconds: f64) {
        self.loop_end = seconds;
    }

    pub fn loop_end(&self) -> f64 {
        self.loop_end
    }

    // -------------------------------
    // MARK: Scheduling
    // -------------------------------

    /// Schedule playback.
    ///
    /// - `when`: stream time in seconds; 0 or less plays immediately
    /// - `offset`: position in the buffer, in seconds
    /// - `duration`: seconds of buffer to play, `None` for the rest of it
    ///
    /// Only one `start` is allowed per node. A missing buffer or an empty
    /// play range is accepted and plays nothing.
    pub fn start(&mut self, when: f64, offset: f64, duration: Option<f64>) -> SourceResult<()> {
        if self.start_called {
            warn!("start called twice on buffer source");
            return Err(SourceError::InvalidState { operation: "start" });
        }

        check_finite("when", when)?;
        check_finite("offset", offset)?;
        if let Some(duration) = duration {
            check_finite("duration", duration)?;
        }

        if let Some(buffer) = &self.buffer {
            if buffer.sample_rate() != self.config.sample_rate {
                warn!(
                    "buffer rate {} != stream rate {}",
                    buffer.sample_rate(),
                    self.config.sample_rate
                );
                return Err(SourceError::SampleRateMismatch {
                    buffer: buffer.sample_rate(),
                    stream: self.config.sample_rate,
                });
            }
        }

        self.start_called = true;

        let Some(buffer) = self.buffer.clone() else {
            debug!("start without a buffer, nothing to play");
            return Ok(());
        };

        let length = buffer.duration_seconds();
        let clamped_offset = offset.max(0.0);
        let end_offset = match duration {
            Some(duration) => (offset + duration).min(length),
            None => length,
        };
        if clamped_offset >= end_offset {
            debug!(
                "empty play range: offset={} end={}, nothing to play",
                clamped_offset, end_offset
            );
            return Ok(());
        }

        let tb = self.time_base;
        let (loop_start, loop_end) = if self.looping {
            let (start, end) = self.loop_region(length);
            (tb.seconds_to_ticks(start), tb.seconds_to_ticks(end))
        } else {
            (0, 0)
        };

        let offset_ticks = tb.seconds_to_ticks(clamped_offset);
        let params = StartParams {
            start: if when > 0.0 { tb.seconds_to_ticks(when) } else { 0 },
            offset: offset_ticks,
            duration: tb.seconds_to_ticks(end_offset).saturating_sub(offset_ticks),
            loop_enabled: self.looping,
            loop_start,
            loop_end,
        };

        debug!(
            "start: tick={} offset={} duration={} loop={} [{}, {})",
            params.start,
            params.offset,
            params.duration,
            params.loop_enabled,
            params.loop_start,
            params.loop_end
        );

        // Buffer first: it must be visible no later than the session.
        self.params.assign_buffer(buffer);
        self.params.configure_start(params);
        Ok(())
    }

    /// Schedule (or reschedule) the end of playback at stream time `when`.
    pub fn stop(&mut self, when: f64) -> SourceResult<()> {
        if !self.start_called {
            warn!("stop called before start on buffer source");
            return Err(SourceError::InvalidState { operation: "stop" });
        }
        check_finite("when", when)?;

        let tick = self.time_base.seconds_to_ticks(when.max(0.0));
        debug!("stop: tick={}", tick);
        self.params.configure_stop(tick);
        Ok(())
    }

    /// Loop region in seconds for a buffer of `length` seconds.
    ///
    /// A valid user region is used (start reset to 0 if past the end, end
    /// clamped to the buffer); anything else loops the whole buffer.
    fn loop_region(&self, length: f64) -> (f64, f64) {
        let (start, end) = (self.loop_start, self.loop_end);
        let user_set = start != 0.0 || end != 0.0;

        if user_set && start >= 0.0 && end > 0.0 && start < end {
            let actual_start = if start > length { 0.0 } else { start };
            (actual_start, end.min(length))
        } else {
            (0.0, length)
        }
    }

    // -------------------------------
    // MARK: Readback
    // -------------------------------

    /// The renderer has signalled finished for the current session.
    pub fn is_finished(&self) -> bool {
        self.readback.finished()
    }

    /// Position of the last quantum the renderer produced.
    pub fn current_position(&self) -> Tick {
        self.readback.position()
    }

    /// `current_position` in seconds.
    pub fn current_time(&self) -> f64 {
        self.time_base.ticks_to_seconds(self.current_position())
    }

    pub fn quanta_rendered(&self) -> u64 {
        self.readback.quanta_rendered()
    }
}

fn check_finite(argument: &'static str, value: f64) -> SourceResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SourceError::NonFinite { argument, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::create_source;
    use crate::tick::TICK_UNBOUNDED;

    const RATE: f64 = 48_000.0;

    fn node_with_buffer(frames: usize) -> BufferSourceNode {
        let (mut node, _renderer) = create_source(EngineConfig::default());
        let buffer = SourceBuffer::new(RATE, vec![vec![0.0; frames], vec![0.0; frames]]).unwrap();
        node.set_buffer(Some(Arc::new(buffer)));
        node
    }

    #[test]
    fn test_start_publishes_whole_buffer() {
        let mut node = node_with_buffer(48_000);
        node.start(0.0, 0.0, None).unwrap();

        let snap = node.params.snapshot();
        assert_eq!(snap.session, 1);
        assert_eq!(snap.start, 0);
        assert_eq!(snap.offset, 0);
        assert_eq!(snap.duration, 48_000);
        assert!(!snap.loop_enabled);
        assert_eq!(snap.stop, TICK_UNBOUNDED);
        assert!(node.params.buffer().is_some());
    }

    #[test]
    fn test_start_converts_times() {
        let mut node = node_with_buffer(48_000);
        node.start(2.0, 0.25, Some(0.5)).unwrap();

        let snap = node.params.snapshot();
        assert_eq!(snap.start, 96_000);
        assert_eq!(snap.offset, 12_000);
        assert_eq!(snap.duration, 24_000);
    }

    #[test]
    fn test_duration_clamped_to_buffer() {
        let mut node = node_with_buffer(48_000);
        node.start(0.0, 0.5, Some(10.0)).unwrap();

        let snap = node.params.snapshot();
        assert_eq!(snap.offset, 24_000);
        assert_eq!(snap.duration, 24_000);
    }

    #[test]
    fn test_negative_when_and_offset_clamp() {
        let mut node = node_with_buffer(48_000);
        node.start(-1.0, -0.5, None).unwrap();

        let snap = node.params.snapshot();
        assert_eq!(snap.start, 0);
        assert_eq!(snap.offset, 0);
        assert_eq!(snap.duration, 48_000);
    }

    #[test]
    fn test_empty_range_publishes_nothing() {
        let mut node = node_with_buffer(48_000);
        node.start(0.0, 2.0, None).unwrap();
        assert_eq!(node.params.session(), 0);
        assert!(node.params.buffer().is_none());
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut node = node_with_buffer(1000);
        node.start(0.0, 0.0, None).unwrap();
        assert_eq!(
            node.start(0.0, 0.0, None),
            Err(SourceError::InvalidState { operation: "start" })
        );
        assert_eq!(node.params.session(), 1);
    }

    #[test]
    fn test_start_without_buffer_is_silent_noop() {
        let (mut node, _renderer) = create_source(EngineConfig::default());
        node.start(0.0, 0.0, None).unwrap();
        assert_eq!(node.params.session(), 0);
        // start still counts
        assert!(node.start(0.0, 0.0, None).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut node = node_with_buffer(1000);
        assert!(matches!(
            node.start(f64::NAN, 0.0, None),
            Err(SourceError::NonFinite { argument: "when", .. })
        ));
        assert!(matches!(
            node.start(0.0, 0.0, Some(f64::INFINITY)),
            Err(SourceError::NonFinite { argument: "duration", .. })
        ));
        // Rejected calls do not consume the one start.
        node.start(0.0, 0.0, None).unwrap();
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let (mut node, _renderer) = create_source(EngineConfig::default());
        let buffer = SourceBuffer::new(44_100.0, vec![vec![0.0; 100]]).unwrap();
        node.set_buffer(Some(Arc::new(buffer)));

        assert_eq!(
            node.start(0.0, 0.0, None),
            Err(SourceError::SampleRateMismatch {
                buffer: 44_100.0,
                stream: 48_000.0
            })
        );
    }

    #[test]
    fn test_stop_before_start_rejected() {
        let mut node = node_with_buffer(1000);
        assert_eq!(
            node.stop(1.0),
            Err(SourceError::InvalidState { operation: "stop" })
        );
    }

    #[test]
    fn test_stop_last_value_wins() {
        let mut node = node_with_buffer(1000);
        node.start(0.0, 0.0, None).unwrap();
        node.stop(1.0).unwrap();
        node.stop(0.5).unwrap();
        assert_eq!(node.params.snapshot().stop, 24_000);

        node.stop(-3.0).unwrap();
        assert_eq!(node.params.snapshot().stop, 0);
    }

    #[test]
    fn test_loop_region_defaults_to_whole_buffer() {
        let mut node = node_with_buffer(48_000);
        node.set_loop(true);
        node.start(0.0, 0.0, None).unwrap();

        let snap = node.params.snapshot();
        assert!(snap.loop_enabled);
        assert_eq!((snap.loop_start, snap.loop_end), (0, 48_000));
    }

    #[test]
    fn test_loop_region_user_values() {
        let mut node = node_with_buffer(48_000);
        node.set_loop(true);
        node.set_loop_start(0.25);
        node.set_loop_end(5.0);
        node.start(0.0, 0.0, None).unwrap();

        let snap = node.params.snapshot();
        assert_eq!((snap.loop_start, snap.loop_end), (12_000, 48_000));
    }

    #[test]
    fn test_loop_region_invalid_falls_back() {
        let mut node = node_with_buffer(48_000);
        node.set_loop_start(0.5);
        node.set_loop_end(0.25);
        assert_eq!(node.loop_region(1.0), (0.0, 1.0));

        node.set_loop_start(2.0);
        node.set_loop_end(3.0);
        assert_eq!(node.loop_region(1.0), (0.0, 1.0));
    }
}
