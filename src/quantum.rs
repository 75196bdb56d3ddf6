// src/quantum.rs
//
// One fixed-size block of renderer output.
//
// The variant says who owns the samples:
// - Silent:  nobody, there are none
// - Aliased: the shared source buffer; the quantum only holds a handle
// - Owned:   the quantum itself, filled by copying

use std::sync::Arc;

use crate::audio_buffer::AudioBuffer;
use crate::config::QUANTUM_FRAMES;
use crate::source_buffer::SourceBuffer;

/// Per-channel storage of an owned quantum.
pub type QuantumBlock = [f32; QUANTUM_FRAMES];

/// Output of one render call.
#[derive(Debug, Clone)]
pub enum Quantum {
    /// No sample storage. Reads as zeros.
    Silent,

    /// Zero-copy view into the source buffer. Every channel starts at the
    /// same frame `offset` and spans `QUANTUM_FRAMES` frames.
    Aliased {
        buffer: Arc<SourceBuffer>,
        offset: usize,
    },

    /// Freshly allocated per-channel blocks.
    Owned(Vec<QuantumBlock>),
}

impl Quantum {
    /// Zeroed storage for an owned quantum.
    pub(crate) fn zeroed_blocks(channels: usize) -> Vec<QuantumBlock> {
        vec![[0.0; QUANTUM_FRAMES]; channels]
    }

    /// Alias `QUANTUM_FRAMES` frames of `buffer` starting at `offset`.
    pub(crate) fn aliased(buffer: &Arc<SourceBuffer>, offset: usize) -> Self {
        debug_assert!(
            offset + QUANTUM_FRAMES <= buffer.frames(),
            "aliased quantum out of range: {} + {} > {}",
            offset,
            QUANTUM_FRAMES,
            buffer.frames()
        );
        Quantum::Aliased {
            buffer: Arc::clone(buffer),
            offset,
        }
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        matches!(self, Quantum::Silent)
    }

    #[inline]
    pub fn is_aliased(&self) -> bool {
        matches!(self, Quantum::Aliased { .. })
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, Quantum::Owned(_))
    }

    /// Number of channels carrying samples (0 for silence).
    pub fn channel_count(&self) -> usize {
        match self {
            Quantum::Silent => 0,
            Quantum::Aliased { buffer, .. } => buffer.channel_count(),
            Quantum::Owned(blocks) => blocks.len(),
        }
    }

    /// Samples of one channel, or `None` for silence / missing channels.
    pub fn channel(&self, ch: usize) -> Option<&[f32]> {
        match self {
            Quantum::Silent => None,
            Quantum::Aliased { buffer, offset } => {
                if ch >= buffer.channel_count() {
                    return None;
                }
                Some(&buffer.channel(ch)[*offset..*offset + QUANTUM_FRAMES])
            }
            Quantum::Owned(blocks) => blocks.get(ch).map(|b| b.as_slice()),
        }
    }

    /// Copy one channel into `dst` (length `QUANTUM_FRAMES`), or zero it.
    #[inline]
    pub fn copy_channel_into(&self, ch: usize, dst: &mut [f32]) {
        match self.channel(ch) {
            Some(src) => dst.copy_from_slice(src),
            None => dst.fill(0.0),
        }
    }

    /// Write this quantum into `out` at frame `frame`.
    ///
    /// Output channels without a matching quantum channel are zeroed; no
    /// up- or down-mixing happens.
    pub fn write_to(&self, out: &mut AudioBuffer, frame: usize) {
        for ch in 0..out.channels {
            self.copy_channel_into(ch, out.span_mut(ch, frame, QUANTUM_FRAMES));
        }
    }
}
