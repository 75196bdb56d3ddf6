// src/audio_buffer.rs

/// Host-owned output block that quanta are written into.
#[derive(Debug)]
pub struct AudioBuffer<'a> {
    pub channels: usize,
    pub frames: usize,
    pub data: &'a mut [f32], // planar: all of ch0, then all of ch1, ...
}

impl<'a> AudioBuffer<'a> {
    /// Create a new AudioBuffer wrapping existing planar data.
    #[inline]
    pub fn new(data: &'a mut [f32], channels: usize) -> Self {
        let frames = if channels == 0 { 0 } else { data.len() / channels };
        Self {
            channels,
            frames,
            data,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.frames;
        &self.data[start..start + self.frames]
    }

    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// Mutable view of `len` frames of one channel starting at `frame`.
    #[inline]
    pub fn span_mut(&mut self, ch: usize, frame: usize, len: usize) -> &mut [f32] {
        &mut self.channel_mut(ch)[frame..frame + len]
    }
}
