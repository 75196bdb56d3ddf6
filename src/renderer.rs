// src/renderer.rs
//
// Block renderer: turns the current stream position and the published
// scheduling parameters into one output quantum.
//
// Per quantum it picks exactly one of:
// - silence
// - a zero-copy alias into the source buffer
// - an owned quantum spliced together from up to a few source ranges
//
// The renderer runs on the audio thread. It must not block, and the only
// allocation it performs is the owned quantum on the slow path.

use std::sync::Arc;

use crate::bridge::SharedReadback;
use crate::loop_state::LoopState;
use crate::parameter::{ParamChannel, ParamSnapshot};
use crate::quantum::Quantum;
use crate::source_buffer::SourceBuffer;
use crate::tick::{QUANTUM_TICKS, Tick};

/// Result of one render call.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub quantum: Quantum,

    /// Advisory: the scheduler may tear the node down. Output for later
    /// positions is still well defined.
    pub finished: bool,
}

impl Rendered {
    #[inline]
    fn silent(finished: bool) -> Self {
        Self {
            quantum: Quantum::Silent,
            finished,
        }
    }

    #[inline]
    fn new(quantum: Quantum, finished: bool) -> Self {
        Self { quantum, finished }
    }
}

/// Render-side half of a buffer source.
///
/// Owns the loop state; reads everything else from the parameter channel.
pub struct BlockRenderer {
    params: Arc<ParamChannel>,
    readback: Arc<SharedReadback>,

    /// Loop progress of the current session.
    loop_state: LoopState,

    /// Session number the loop state belongs to.
    session: u64,
}

impl BlockRenderer {
    pub(crate) fn new(params: Arc<ParamChannel>, readback: Arc<SharedReadback>) -> Self {
        Self {
            params,
            readback,
            loop_state: LoopState::NotLooping,
            session: 0,
        }
    }

    #[inline]
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Produce the quantum covering `[position, position + QUANTUM_FRAMES)`.
    ///
    /// Called once per quantum by the scheduler. Lock-free.
    pub fn produce_quantum(&mut self, position: Tick) -> Rendered {
        let snapshot = self.params.snapshot();
        let buffer = self.params.buffer();

        let rendered = match buffer {
            // Nothing started, or nothing to play.
            _ if snapshot.session == 0 => Rendered::silent(false),
            None => Rendered::silent(false),
            Some(buffer) => {
                let params = snapshot.clamp_to(buffer.frames());
                if params.session != self.session {
                    self.begin_session(&params);
                }
                render_block(position, &params, &buffer, &mut self.loop_state)
            }
        };

        self.readback.publish(position, rendered.finished);
        rendered
    }

    fn begin_session(&mut self, params: &ParamSnapshot) {
        self.session = params.session;
        self.loop_state = LoopState::for_session(params.loop_enabled);
        self.readback.reset();
    }
}

//
// ===============================
// MARK: Block construction
// ===============================
//

/// Render one quantum from a clamped parameter snapshot.
///
/// Pure apart from advancing `state`. `params` must come from
/// `ParamSnapshot::clamp_to(buffer.frames())`.
pub fn render_block(
    pos: Tick,
    params: &ParamSnapshot,
    buffer: &Arc<SourceBuffer>,
    state: &mut LoopState,
) -> Rendered {
    let end = pos.saturating_add(QUANTUM_TICKS);

    if end <= params.start {
        return Rendered::silent(false);
    }

    let effective_end = params.effective_end();
    let mut finished = false;

    if state.is_loop_mode() {
        // Loop until stop() has been reached
        if params.stop_bounded() && end >= params.stop {
            return Rendered::silent(true);
        }
    } else {
        // Passing stop alone does not finish: stop may be moved again.
        finished = end >= params.natural_end();
        if pos >= effective_end || params.start >= effective_end {
            return Rendered::silent(finished);
        }
    }

    let channels = buffer.channel_count();
    if channels == 0 {
        return Rendered::silent(finished);
    }

    // Loop region collapsed mid-session.
    if state.is_loop_mode() && !params.loop_enabled {
        return Rendered::silent(finished);
    }

    // A position that jumped past the loop boundary is already looping.
    if *state == LoopState::WillLoop && pos >= params.loop_boundary() {
        *state = LoopState::IsLooping;
    }

    match *state {
        LoopState::NotLooping => {
            if pos >= params.start && end <= effective_end {
                let quantum = Quantum::aliased(buffer, source_frame(params, pos));
                return Rendered::new(quantum, finished);
            }
        }

        LoopState::WillLoop => {
            let boundary = params.loop_boundary();
            if pos >= params.start && end <= boundary {
                let quantum = Quantum::aliased(buffer, source_frame(params, pos));
                *state = state.after_quantum(end, boundary);
                return Rendered::new(quantum, finished);
            }
        }

        LoopState::IsLooping => {
            if pos >= params.start {
                let distance = loop_distance(params, pos);
                if distance + QUANTUM_TICKS <= params.loop_len() {
                    let quantum =
                        Quantum::aliased(buffer, (params.loop_start + distance) as usize);
                    return Rendered::new(quantum, finished);
                }
            }
        }
    }

    // Close to an edge: build the quantum by hand.
    let mut blocks = Quantum::zeroed_blocks(channels);
    let first = pos.max(params.start);
    let loop_start = params.loop_start as usize;
    let loop_end = params.loop_end as usize;

    match *state {
        LoopState::NotLooping => {
            let last = end.min(effective_end);
            let src = source_frame(params, first);
            let dst = (first - pos) as usize;
            let len = (last - first) as usize;

            for (ch, block) in blocks.iter_mut().enumerate() {
                block[dst..dst + len].copy_from_slice(&buffer.channel(ch)[src..src + len]);
            }
        }

        LoopState::WillLoop => {
            let boundary = params.loop_boundary();
            let last = end.min(params.stop);
            let pre_end = last.min(boundary);

            let src = source_frame(params, first);
            let dst = (first - pos) as usize;
            let pre_len = (pre_end - first) as usize;
            let tail = (pre_end - pos) as usize..(last - pos) as usize;

            for (ch, block) in blocks.iter_mut().enumerate() {
                let data = buffer.channel(ch);
                // Copy the chunk before we hit the loop point
                block[dst..dst + pre_len].copy_from_slice(&data[src..src + pre_len]);
                // Start back from loop_start and fill in the rest
                fill_from_loop(&mut block[tail.clone()], data, loop_start, loop_end, loop_start);
            }

            *state = state.after_quantum(end, boundary);
        }

        LoopState::IsLooping => {
            let last = end.min(params.stop);
            let read = loop_start + loop_distance(params, first) as usize;
            let span = (first - pos) as usize..(last - pos) as usize;

            for (ch, block) in blocks.iter_mut().enumerate() {
                fill_from_loop(&mut block[span.clone()], buffer.channel(ch), loop_start, loop_end, read);
            }
        }
    }

    Rendered::new(Quantum::Owned(blocks), finished)
}

/// Source frame played at tick `t` before any wrap.
#[inline]
fn source_frame(params: &ParamSnapshot, t: Tick) -> usize {
    (t - params.start + params.offset) as usize
}

/// Distance of tick `t` from loop_start once looping:
/// `(t - start + offset - loop_end) mod loop_len`.
///
/// Signed 128-bit so ticks anywhere in the u64 range stay exact.
#[inline]
fn loop_distance(params: &ParamSnapshot, t: Tick) -> u64 {
    let into_loop = t as i128 - params.start as i128 + params.offset as i128
        - params.loop_end as i128;
    into_loop.rem_euclid(params.loop_len() as i128) as u64
}

/// Copy from the loop region into `dst`, starting at `read` and wrapping
/// back to `loop_start` each time `loop_end` is hit.
#[inline]
fn fill_from_loop(dst: &mut [f32], src: &[f32], loop_start: usize, loop_end: usize, mut read: usize) {
    debug_assert!(loop_start <= read && read < loop_end);

    let mut written = 0;
    while written < dst.len() {
        let n = (dst.len() - written).min(loop_end - read);
        dst[written..written + n].copy_from_slice(&src[read..read + n]);
        written += n;
        read = loop_start;
    }
}
