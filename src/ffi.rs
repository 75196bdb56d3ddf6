// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - A node handle is used from the control thread only, a stream handle
//   from the audio thread only
// - Caller must call the corresponding _destroy function for each _create

use std::sync::Arc;

use log::{LevelFilter, debug, warn};
use oslog::OsLogger;

use crate::bridge::create_source;
use crate::config::{EngineConfig, QUANTUM_FRAMES};
use crate::error::SourceError;
use crate::source_buffer::SourceBuffer;
use crate::source_node::BufferSourceNode;
use crate::stream::SourceStream;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.bufsource.engine";

// Status codes returned by control calls
pub const BUFSOURCE_OK: i32 = 0;
pub const BUFSOURCE_ERR_NULL: i32 = -1;
pub const BUFSOURCE_ERR_INVALID_STATE: i32 = 1;
pub const BUFSOURCE_ERR_NON_FINITE: i32 = 2;
pub const BUFSOURCE_ERR_SAMPLE_RATE: i32 = 3;
pub const BUFSOURCE_ERR_BUFFER: i32 = 4;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup. Logs appear in Console.app and
/// Xcode's debug console.
#[unsafe(no_mangle)]
pub extern "C" fn bufsource_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the control side.
pub struct BufsourceNode {
    inner: BufferSourceNode,
}

/// Opaque handle to the render side.
pub struct BufsourceStream {
    inner: SourceStream,
}

fn status_code(err: &SourceError) -> i32 {
    match err {
        SourceError::InvalidState { .. } => BUFSOURCE_ERR_INVALID_STATE,
        SourceError::NonFinite { .. } => BUFSOURCE_ERR_NON_FINITE,
        SourceError::SampleRateMismatch { .. } => BUFSOURCE_ERR_SAMPLE_RATE,
        SourceError::ChannelLengthMismatch { .. } | SourceError::RaggedInterleaved { .. } => {
            BUFSOURCE_ERR_BUFFER
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Create a buffer source.
///
/// Returns the control handle and writes the render handle to `stream_out`.
/// Free them with `bufsource_destroy` and `bufsource_stream_destroy`.
///
/// # Safety
/// `stream_out` must be a valid pointer to writable storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_create(
    sample_rate: f64,
    stream_out: *mut *mut BufsourceStream,
) -> *mut BufsourceNode {
    if stream_out.is_null() {
        return std::ptr::null_mut();
    }

    let config = EngineConfig::default().with_sample_rate(sample_rate);
    let (node, renderer) = create_source(config);
    let stream = SourceStream::new(renderer, &config);

    debug!("bufsource_create: sample_rate={}", sample_rate);

    unsafe { *stream_out = Box::into_raw(Box::new(BufsourceStream { inner: stream })) };
    Box::into_raw(Box::new(BufsourceNode { inner: node }))
}

/// Destroy a control handle.
///
/// # Safety
/// `node` must have been returned by `bufsource_create` and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_destroy(node: *mut BufsourceNode) {
    if !node.is_null() {
        drop(unsafe { Box::from_raw(node) });
    }
}

/// Destroy a render handle.
///
/// # Safety
/// `stream` must have been produced by `bufsource_create` and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_stream_destroy(stream: *mut BufsourceStream) {
    if !stream.is_null() {
        drop(unsafe { Box::from_raw(stream) });
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control Side
// ═══════════════════════════════════════════════════════════════════════════

/// Set the source buffer from planar data (`channels * frames` floats,
/// channel after channel). The data is copied.
///
/// # Safety
/// `data` must point to at least `channels * frames` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_set_buffer(
    node: *mut BufsourceNode,
    sample_rate: f64,
    channels: u32,
    frames: u32,
    data: *const f32,
) -> i32 {
    if node.is_null() || (data.is_null() && channels > 0 && frames > 0) {
        return BUFSOURCE_ERR_NULL;
    }

    let frames = frames as usize;
    let planar: Vec<Vec<f32>> = (0..channels as usize)
        .map(|ch| {
            if frames == 0 {
                Vec::new()
            } else {
                unsafe { std::slice::from_raw_parts(data.add(ch * frames), frames) }.to_vec()
            }
        })
        .collect();

    match SourceBuffer::new(sample_rate, planar) {
        Ok(buffer) => {
            unsafe { (*node).inner.set_buffer(Some(Arc::new(buffer))) };
            BUFSOURCE_OK
        }
        Err(e) => {
            warn!("bufsource_set_buffer: {}", e);
            status_code(&e)
        }
    }
}

/// Configure looping. Times are in seconds; (0, 0) loops the whole buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_set_loop(
    node: *mut BufsourceNode,
    enabled: bool,
    loop_start: f64,
    loop_end: f64,
) {
    if node.is_null() {
        return;
    }
    let inner = unsafe { &mut (*node).inner };
    inner.set_loop(enabled);
    inner.set_loop_start(loop_start);
    inner.set_loop_end(loop_end);
}

/// Start playback. A negative `duration` means "to the end of the buffer".
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_start(
    node: *mut BufsourceNode,
    when: f64,
    offset: f64,
    duration: f64,
) -> i32 {
    if node.is_null() {
        return BUFSOURCE_ERR_NULL;
    }
    let duration = (duration >= 0.0 || duration.is_nan()).then_some(duration);
    match unsafe { (*node).inner.start(when, offset, duration) } {
        Ok(()) => BUFSOURCE_OK,
        Err(e) => status_code(&e),
    }
}

/// Schedule the stop time in seconds. May be called repeatedly.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_stop(node: *mut BufsourceNode, when: f64) -> i32 {
    if node.is_null() {
        return BUFSOURCE_ERR_NULL;
    }
    match unsafe { (*node).inner.stop(when) } {
        Ok(()) => BUFSOURCE_OK,
        Err(e) => status_code(&e),
    }
}

/// Whether the renderer has reported finished.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_is_finished(node: *const BufsourceNode) -> bool {
    if node.is_null() {
        return false;
    }
    unsafe { (*node).inner.is_finished() }
}

// ═══════════════════════════════════════════════════════════════════════════
// Render Side
// ═══════════════════════════════════════════════════════════════════════════

/// Render `frames` frames of stereo output.
///
/// Rendering happens in whole quanta; a trailing partial quantum is
/// silent. Source channel 0 goes left, channel 1 right; a mono source
/// leaves the right channel silent.
///
/// # Safety
/// Both output pointers must be valid for `frames` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_render(
    stream: *mut BufsourceStream,
    frames: u32,
    output_left: *mut f32,
    output_right: *mut f32,
) {
    let total_frames = frames as usize;

    // Fill with silence if invalid
    if stream.is_null() || output_left.is_null() || output_right.is_null() {
        if !output_left.is_null() {
            unsafe { std::ptr::write_bytes(output_left, 0, total_frames) };
        }
        if !output_right.is_null() {
            unsafe { std::ptr::write_bytes(output_right, 0, total_frames) };
        }
        return;
    }

    let stream = unsafe { &mut (*stream).inner };
    let out_left = unsafe { std::slice::from_raw_parts_mut(output_left, total_frames) };
    let out_right = unsafe { std::slice::from_raw_parts_mut(output_right, total_frames) };

    let whole = total_frames - total_frames % QUANTUM_FRAMES;
    for frame in (0..whole).step_by(QUANTUM_FRAMES) {
        let span = frame..frame + QUANTUM_FRAMES;
        match stream.process() {
            Some(rendered) => {
                rendered.quantum.copy_channel_into(0, &mut out_left[span.clone()]);
                rendered.quantum.copy_channel_into(1, &mut out_right[span]);
            }
            None => {
                out_left[span.clone()].fill(0.0);
                out_right[span].fill(0.0);
            }
        }
    }

    out_left[whole..].fill(0.0);
    out_right[whole..].fill(0.0);
}

/// Absolute position of the next quantum.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufsource_stream_position(stream: *const BufsourceStream) -> u64 {
    if stream.is_null() {
        return 0;
    }
    unsafe { (*stream).inner.position() }
}
