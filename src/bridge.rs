//! Pairs the control side and the render side of one buffer source.
//!
//! # Architecture
//!
//! - **Control thread** owns [`BufferSourceNode`]: validates calls and writes
//!   the parameter channel
//! - **Audio thread** owns [`BlockRenderer`]: reads the parameter channel and
//!   writes the readback
//! - Both directions are lock-free atomics; the source buffer is published
//!   through `arc-swap`
//!
//! # Usage
//!
//! ```ignore
//! let (mut node, mut renderer) = create_source(EngineConfig::default());
//!
//! // Control thread
//! node.set_buffer(Some(buffer));
//! node.start(0.0, 0.0, None)?;
//!
//! // Audio thread, once per quantum
//! let rendered = renderer.produce_quantum(position);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::config::EngineConfig;
use crate::parameter::ParamChannel;
use crate::renderer::BlockRenderer;
use crate::source_node::BufferSourceNode;

/// Lock-free render -> control readback.
#[derive(Debug)]
pub struct SharedReadback {
    /// Latched once the renderer signals finished; cleared on a new session.
    finished: AtomicBool,

    /// Position of the last rendered quantum.
    position: AtomicU64,

    /// Number of quanta rendered since the bridge was created.
    quanta: AtomicU64,
}

impl SharedReadback {
    pub(crate) fn new() -> Self {
        Self {
            finished: AtomicBool::new(false),
            position: AtomicU64::new(0),
            quanta: AtomicU64::new(0),
        }
    }

    /// Render side: record one produced quantum.
    #[inline]
    pub(crate) fn publish(&self, position: u64, finished: bool) {
        self.position.store(position, Ordering::Relaxed);
        self.quanta.fetch_add(1, Ordering::Relaxed);
        if finished {
            self.finished.store(true, Ordering::Release);
        }
    }

    /// Render side: a new playback session began.
    #[inline]
    pub(crate) fn reset(&self) {
        self.finished.store(false, Ordering::Release);
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn quanta_rendered(&self) -> u64 {
        self.quanta.load(Ordering::Relaxed)
    }
}

/// Create a linked control/render pair for one buffer source.
pub fn create_source(config: EngineConfig) -> (BufferSourceNode, BlockRenderer) {
    let params = Arc::new(ParamChannel::new());
    let readback = Arc::new(SharedReadback::new());

    let node = BufferSourceNode::new(config, Arc::clone(&params), Arc::clone(&readback));
    let renderer = BlockRenderer::new(params, readback);

    (node, renderer)
}
