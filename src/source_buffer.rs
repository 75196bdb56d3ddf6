// src/source_buffer.rs
//
// Immutable, pre-decoded sample data shared between the control side
// (which obtained it) and the renderer (which only reads it).

use crate::error::{SourceError, SourceResult};

/// Shared source audio.
///
/// Channels are planar and all have `frames` samples. The buffer is never
/// mutated once built, so the render thread reads it without locking.
/// Wrap it in an `Arc` to share it.
#[derive(Debug)]
pub struct SourceBuffer {
    /// Sample rate of the audio.
    sample_rate: f64,
    /// Frames per channel.
    frames: usize,
    /// One contiguous slice per channel.
    channels: Vec<Box<[f32]>>,
}

impl SourceBuffer {
    /// Build from planar channel data.
    ///
    /// All channels must have the same length. An empty `channels` vector is
    /// accepted and renders as silence.
    pub fn new(sample_rate: f64, channels: Vec<Vec<f32>>) -> SourceResult<Self> {
        let frames = channels.first().map(Vec::len).unwrap_or(0);

        for (index, channel) in channels.iter().enumerate() {
            if channel.len() != frames {
                return Err(SourceError::ChannelLengthMismatch {
                    channel: index,
                    expected: frames,
                    actual: channel.len(),
                });
            }
        }

        Ok(Self {
            sample_rate,
            frames,
            channels: channels.into_iter().map(Vec::into_boxed_slice).collect(),
        })
    }

    /// Build from interleaved data (ch0, ch1, .. frame by frame).
    pub fn from_interleaved(
        sample_rate: f64,
        channel_count: usize,
        samples: &[f32],
    ) -> SourceResult<Self> {
        if channel_count == 0 {
            return Self::new(sample_rate, Vec::new());
        }
        if samples.len() % channel_count != 0 {
            return Err(SourceError::RaggedInterleaved {
                samples: samples.len(),
                channels: channel_count,
            });
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in seconds at the buffer's own rate.
    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch]
    }
}
