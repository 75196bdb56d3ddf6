//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { BufferSourcePlayer } from './bufsource.js';
//!
//! await init();
//!
//! const player = new BufferSourcePlayer(48000);
//! player.set_buffer(48000, 2, planarSamples);
//! player.set_loop(true, 0.5, 1.0);
//! player.start(0, 0, -1);
//!
//! // In the AudioWorklet, once per 128-frame quantum
//! const planar = player.render_quantum();
//! ```

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::bridge::create_source;
use crate::config::{EngineConfig, QUANTUM_FRAMES};
use crate::source_buffer::SourceBuffer;
use crate::source_node::BufferSourceNode;
use crate::stream::SourceStream;

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn bufsource_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

/// Buffer source with both halves in one object.
///
/// In the browser the control and render sides share the worklet thread.
#[wasm_bindgen]
pub struct BufferSourcePlayer {
    node: BufferSourceNode,
    stream: SourceStream,
    channels: usize,
}

#[wasm_bindgen]
impl BufferSourcePlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> BufferSourcePlayer {
        let config = EngineConfig::default().with_sample_rate(sample_rate);
        let (node, renderer) = create_source(config);
        BufferSourcePlayer {
            node,
            stream: SourceStream::new(renderer, &config),
            channels: 0,
        }
    }

    /// Set the source from planar samples (channel after channel).
    pub fn set_buffer(
        &mut self,
        sample_rate: f64,
        channels: u32,
        samples: &[f32],
    ) -> Result<(), JsError> {
        let channels = channels as usize;
        let frames = if channels == 0 { 0 } else { samples.len() / channels };
        let planar = (0..channels)
            .map(|ch| samples[ch * frames..(ch + 1) * frames].to_vec())
            .collect();

        let buffer = SourceBuffer::new(sample_rate, planar)?;
        self.node.set_buffer(Some(Arc::new(buffer)));
        self.channels = channels;
        Ok(())
    }

    /// Configure looping. Times are in seconds; (0, 0) loops the whole buffer.
    pub fn set_loop(&mut self, enabled: bool, loop_start: f64, loop_end: f64) {
        self.node.set_loop(enabled);
        self.node.set_loop_start(loop_start);
        self.node.set_loop_end(loop_end);
    }

    /// Start playback. A negative `duration` plays to the end of the buffer.
    pub fn start(&mut self, when: f64, offset: f64, duration: f64) -> Result<(), JsError> {
        let duration = (duration >= 0.0 || duration.is_nan()).then_some(duration);
        self.node.start(when, offset, duration)?;
        Ok(())
    }

    pub fn stop(&mut self, when: f64) -> Result<(), JsError> {
        self.node.stop(when)?;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.node.is_finished()
    }

    pub fn is_torn_down(&self) -> bool {
        self.stream.is_torn_down()
    }

    /// Absolute position of the next quantum, in ticks.
    pub fn position(&self) -> f64 {
        self.stream.position() as f64
    }

    /// Render one quantum as planar samples (`channels * 128` floats).
    pub fn render_quantum(&mut self) -> Vec<f32> {
        let mut out = vec![0.0f32; self.channels * QUANTUM_FRAMES];
        if let Some(rendered) = self.stream.process() {
            for (ch, dst) in out.chunks_exact_mut(QUANTUM_FRAMES).enumerate() {
                rendered.quantum.copy_channel_into(ch, dst);
            }
        }
        out
    }
}
