// src/stream.rs

use crate::audio_buffer::AudioBuffer;
use crate::config::{EngineConfig, QUANTUM_FRAMES};
use crate::renderer::{BlockRenderer, Rendered};
use crate::tick::{QUANTUM_TICKS, Tick};

/// Drives one renderer the way the graph scheduler does.
///
/// This struct:
/// - runs on the audio thread
/// - tracks the node's absolute position
/// - advances exactly one quantum per render call
/// - stops calling the renderer after it reports finished, if configured to
pub struct SourceStream {
    renderer: BlockRenderer,

    /// Absolute position of the next quantum.
    position: Tick,

    teardown_on_finish: bool,
    torn_down: bool,
}

impl SourceStream {
    pub fn new(renderer: BlockRenderer, config: &EngineConfig) -> Self {
        Self {
            renderer,
            position: 0,
            teardown_on_finish: config.teardown_on_finish,
            torn_down: false,
        }
    }

    /// Begin at `position` instead of tick 0.
    pub fn starting_at(mut self, position: Tick) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn position(&self) -> Tick {
        self.position
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn renderer(&self) -> &BlockRenderer {
        &self.renderer
    }

    /// Render the next quantum, or `None` once torn down.
    ///
    /// The position advances either way.
    pub fn process(&mut self) -> Option<Rendered> {
        let position = self.position;
        self.position = self.position.saturating_add(QUANTUM_TICKS);

        if self.torn_down {
            return None;
        }

        let rendered = self.renderer.produce_quantum(position);
        if rendered.finished && self.teardown_on_finish {
            self.torn_down = true;
        }
        Some(rendered)
    }

    /// Fill `out` with consecutive quanta.
    ///
    /// `out.frames` should be a multiple of `QUANTUM_FRAMES`; a trailing
    /// partial quantum is zeroed and no time is spent on it.
    /// Returns false once the stream is torn down.
    pub fn render_into(&mut self, out: &mut AudioBuffer) -> bool {
        debug_assert!(
            out.frames % QUANTUM_FRAMES == 0,
            "output block of {} frames is not a whole number of quanta",
            out.frames
        );

        let quanta = out.frames / QUANTUM_FRAMES;
        for index in 0..quanta {
            let frame = index * QUANTUM_FRAMES;
            match self.process() {
                Some(rendered) => rendered.quantum.write_to(out, frame),
                None => {
                    for ch in 0..out.channels {
                        out.span_mut(ch, frame, QUANTUM_FRAMES).fill(0.0);
                    }
                }
            }
        }

        let remainder = quanta * QUANTUM_FRAMES;
        for ch in 0..out.channels {
            out.channel_mut(ch)[remainder..].fill(0.0);
        }

        !self.torn_down
    }
}
