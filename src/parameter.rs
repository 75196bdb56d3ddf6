// src/parameter.rs
//
// Scheduling parameters published from the control thread to the render
// thread.
//
// One atomic slot per field. Single writer (control), single reader
// (render). The renderer only needs the latest value of each field, never
// a history, so a slot is enough.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use crate::source_buffer::SourceBuffer;
use crate::tick::{TICK_UNBOUNDED, Tick};

/// Time-valued parameters (absolute stream ticks).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickParam {
    Start,
    Stop,
}

/// Integer sample-count parameters (frames into the source buffer).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SampleParam {
    Offset,
    Duration,
    LoopStart,
    LoopEnd,
}

/// Everything one `start` call sets, already validated by the control side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StartParams {
    pub start: Tick,
    pub offset: u64,
    pub duration: u64,
    pub loop_enabled: bool,
    pub loop_start: u64,
    pub loop_end: u64,
}

/// Lock-free parameter slots shared by the control and render sides.
pub struct ParamChannel {
    start: AtomicU64,
    stop: AtomicU64,
    offset: AtomicU64,
    duration: AtomicU64,
    loop_enabled: AtomicBool,
    loop_start: AtomicU64,
    loop_end: AtomicU64,

    /// Bumped after every `configure_start`; the renderer reseeds its loop
    /// state when it sees a new value.
    session: AtomicU64,

    /// Immutable source, swapped in whole.
    buffer: ArcSwapOption<SourceBuffer>,
}

impl Default for ParamChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamChannel {
    pub fn new() -> Self {
        Self {
            start: AtomicU64::new(0),
            stop: AtomicU64::new(TICK_UNBOUNDED),
            offset: AtomicU64::new(0),
            duration: AtomicU64::new(0),
            loop_enabled: AtomicBool::new(false),
            loop_start: AtomicU64::new(0),
            loop_end: AtomicU64::new(0),
            session: AtomicU64::new(0),
            buffer: ArcSwapOption::empty(),
        }
    }

    // -------------------------------
    // MARK: Control side
    // -------------------------------

    #[inline]
    pub fn set_tick(&self, param: TickParam, value: Tick) {
        let slot = match param {
            TickParam::Start => &self.start,
            TickParam::Stop => &self.stop,
        };
        slot.store(value, Ordering::Release);
    }

    #[inline]
    pub fn set_samples(&self, param: SampleParam, value: u64) {
        let slot = match param {
            SampleParam::Offset => &self.offset,
            SampleParam::Duration => &self.duration,
            SampleParam::LoopStart => &self.loop_start,
            SampleParam::LoopEnd => &self.loop_end,
        };
        slot.store(value, Ordering::Release);
    }

    #[inline]
    pub fn set_loop_enabled(&self, enabled: bool) {
        self.loop_enabled.store(enabled, Ordering::Release);
    }

    /// Publish the source buffer. Must happen no later than the first
    /// `configure_start`.
    pub fn assign_buffer(&self, buffer: Arc<SourceBuffer>) {
        self.buffer.store(Some(buffer));
    }

    /// Publish a start configuration and open a new playback session.
    pub fn configure_start(&self, params: StartParams) {
        self.set_tick(TickParam::Start, params.start);
        self.set_samples(SampleParam::Offset, params.offset);
        self.set_samples(SampleParam::Duration, params.duration);
        self.set_loop_enabled(params.loop_enabled);
        self.set_samples(SampleParam::LoopStart, params.loop_start);
        self.set_samples(SampleParam::LoopEnd, params.loop_end);

        // Release: every field above is visible to whoever acquires the new
        // session number.
        self.session.fetch_add(1, Ordering::Release);
    }

    /// Schedule (or reschedule) the stop tick. Last value wins.
    #[inline]
    pub fn configure_stop(&self, stop: Tick) {
        self.set_tick(TickParam::Stop, stop);
    }

    // -------------------------------
    // MARK: Render side
    // -------------------------------

    /// Current session number. 0 means `configure_start` was never called.
    #[inline]
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::Acquire)
    }

    /// Read every field.
    ///
    /// Audio-thread-safe, lock-free.
    pub fn snapshot(&self) -> ParamSnapshot {
        let session = self.session.load(Ordering::Acquire);
        ParamSnapshot {
            session,
            start: self.start.load(Ordering::Acquire),
            stop: self.stop.load(Ordering::Acquire),
            offset: self.offset.load(Ordering::Acquire),
            duration: self.duration.load(Ordering::Acquire),
            loop_enabled: self.loop_enabled.load(Ordering::Acquire),
            loop_start: self.loop_start.load(Ordering::Acquire),
            loop_end: self.loop_end.load(Ordering::Acquire),
        }
    }

    /// Current source buffer handle.
    ///
    /// Audio-thread-safe, lock-free, no allocation.
    #[inline]
    pub fn buffer(&self) -> Option<Arc<SourceBuffer>> {
        self.buffer.load_full()
    }
}

//
// ===============================
// MARK: Snapshot
// ===============================
//

/// Plain copy of the parameters as seen by one render call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParamSnapshot {
    pub session: u64,
    pub start: Tick,
    pub stop: Tick,
    pub offset: u64,
    pub duration: u64,
    pub loop_enabled: bool,
    pub loop_start: u64,
    pub loop_end: u64,
}

impl ParamSnapshot {
    /// Restrict every source read to `[0, frames)`.
    ///
    /// - offset and duration are clamped to the buffer
    /// - loop_end is clamped to the buffer
    /// - an empty or inverted loop region disables looping
    /// - an offset at or past loop_end is wrapped into the loop region
    pub fn clamp_to(mut self, frames: usize) -> Self {
        let len = frames as u64;

        self.offset = self.offset.min(len);
        self.duration = self.duration.min(len - self.offset);
        self.loop_end = self.loop_end.min(len);
        self.loop_enabled = self.loop_enabled && self.loop_start < self.loop_end;

        if self.loop_enabled && self.offset >= self.loop_end {
            self.offset = self.loop_start + (self.offset - self.loop_end) % self.loop_len();
        }

        self
    }

    #[inline]
    pub fn stop_bounded(&self) -> bool {
        self.stop != TICK_UNBOUNDED
    }

    /// `start + duration`: where playback ends without looping or stop.
    #[inline]
    pub fn natural_end(&self) -> Tick {
        self.start.saturating_add(self.duration)
    }

    /// Earlier of the natural end and the stop tick.
    #[inline]
    pub fn effective_end(&self) -> Tick {
        self.natural_end().min(self.stop)
    }

    /// Loop length in frames. Only meaningful while looping is enabled.
    #[inline]
    pub fn loop_len(&self) -> u64 {
        self.loop_end - self.loop_start
    }

    /// Tick where the virtual timeline first reaches `loop_end`, capped at
    /// the stop tick.
    #[inline]
    pub fn loop_boundary(&self) -> Tick {
        debug_assert!(self.offset < self.loop_end);
        self.start
            .saturating_add(self.loop_end - self.offset)
            .min(self.stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(offset: u64, duration: u64, loop_start: u64, loop_end: u64) -> ParamSnapshot {
        ParamSnapshot {
            session: 1,
            start: 0,
            stop: TICK_UNBOUNDED,
            offset,
            duration,
            loop_enabled: true,
            loop_start,
            loop_end,
        }
    }

    #[test]
    fn test_defaults() {
        let channel = ParamChannel::new();
        let snap = channel.snapshot();
        assert_eq!(snap.session, 0);
        assert_eq!(snap.stop, TICK_UNBOUNDED);
        assert!(!snap.loop_enabled);
        assert!(channel.buffer().is_none());
    }

    #[test]
    fn test_configure_start_opens_session() {
        let channel = ParamChannel::new();
        channel.configure_start(StartParams {
            start: 10,
            offset: 5,
            duration: 100,
            loop_enabled: true,
            loop_start: 20,
            loop_end: 80,
        });

        let snap = channel.snapshot();
        assert_eq!(snap.session, 1);
        assert_eq!(snap.start, 10);
        assert_eq!(snap.offset, 5);
        assert_eq!(snap.duration, 100);
        assert!(snap.loop_enabled);
        assert_eq!((snap.loop_start, snap.loop_end), (20, 80));

        channel.configure_start(StartParams::default());
        assert_eq!(channel.session(), 2);
    }

    #[test]
    fn test_stop_last_value_wins() {
        let channel = ParamChannel::new();
        channel.configure_stop(500);
        channel.configure_stop(300);
        assert_eq!(channel.snapshot().stop, 300);
        // Stop does not open a session.
        assert_eq!(channel.session(), 0);
    }

    #[test]
    fn test_individual_setters() {
        let channel = ParamChannel::new();
        channel.set_tick(TickParam::Start, 7);
        channel.set_samples(SampleParam::LoopEnd, 9);
        channel.set_loop_enabled(true);

        let snap = channel.snapshot();
        assert_eq!(snap.start, 7);
        assert_eq!(snap.loop_end, 9);
        assert!(snap.loop_enabled);
    }

    #[test]
    fn test_assign_buffer() {
        let channel = ParamChannel::new();
        let buffer = Arc::new(SourceBuffer::new(48_000.0, vec![vec![0.0; 4]]).unwrap());
        channel.assign_buffer(Arc::clone(&buffer));

        let loaded = channel.buffer().unwrap();
        assert!(Arc::ptr_eq(&loaded, &buffer));
    }

    #[test]
    fn test_clamp_offset_and_duration() {
        let snap = ParamSnapshot {
            loop_enabled: false,
            ..snapshot(900, 500, 0, 0)
        }
        .clamp_to(1000);
        assert_eq!(snap.offset, 900);
        assert_eq!(snap.duration, 100);

        let snap = snapshot(2000, 10, 0, 0).clamp_to(1000);
        assert_eq!(snap.offset, 1000);
        assert_eq!(snap.duration, 0);
    }

    #[test]
    fn test_clamp_degenerate_loop_disables() {
        assert!(!snapshot(0, 10, 300, 300).clamp_to(1000).loop_enabled);
        assert!(!snapshot(0, 10, 400, 300).clamp_to(1000).loop_enabled);
        // loop_end clamps to the buffer and collapses the region
        assert!(!snapshot(0, 10, 1000, 1500).clamp_to(1000).loop_enabled);
    }

    #[test]
    fn test_clamp_wraps_offset_into_loop() {
        let snap = snapshot(350, 1000, 200, 300).clamp_to(1000);
        assert!(snap.loop_enabled);
        assert_eq!(snap.offset, 250);

        let snap = snapshot(300, 1000, 200, 300).clamp_to(1000);
        assert_eq!(snap.offset, 200);
    }

    #[test]
    fn test_loop_boundary() {
        let mut snap = snapshot(50, 1000, 200, 300);
        snap.start = 1000;
        assert_eq!(snap.loop_boundary(), 1250);

        snap.stop = 1100;
        assert_eq!(snap.loop_boundary(), 1100);
    }

    #[test]
    fn test_effective_end() {
        let mut snap = snapshot(0, 1000, 0, 0);
        snap.start = 64;
        assert_eq!(snap.natural_end(), 1064);
        assert_eq!(snap.effective_end(), 1064);
        snap.stop = 512;
        assert_eq!(snap.effective_end(), 512);
        assert!(snap.stop_bounded());
    }
}
