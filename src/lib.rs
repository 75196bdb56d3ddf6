// src/lib.rs
//
// Library entry point for Rust and FFI consumers.

mod audio_buffer;
mod bridge;
mod config;
mod error;
mod loop_state;
mod parameter;
mod quantum;
mod renderer;
mod source_buffer;
mod source_node;
mod stream;
mod tick;

#[cfg(feature = "ios")]
pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use audio_buffer::AudioBuffer;
pub use bridge::{SharedReadback, create_source};
pub use config::{DEFAULT_SAMPLE_RATE, EngineConfig, QUANTUM_FRAMES};
pub use error::{SourceError, SourceResult};
pub use loop_state::LoopState;
pub use parameter::{ParamChannel, ParamSnapshot, SampleParam, StartParams, TickParam};
pub use quantum::{Quantum, QuantumBlock};
pub use renderer::{BlockRenderer, Rendered, render_block};
pub use source_buffer::SourceBuffer;
pub use source_node::BufferSourceNode;
pub use stream::SourceStream;
pub use tick::{QUANTUM_TICKS, TICK_UNBOUNDED, Tick, TimeBase};
