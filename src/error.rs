// src/error.rs

/// Error raised by the control side of a buffer source.
///
/// The render side never returns errors; degenerate configurations render
/// silence instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The call is not valid in the node's current state
    /// (e.g. a second `start`, or `stop` before `start`).
    InvalidState { operation: &'static str },

    /// A time argument was NaN or infinite.
    NonFinite { argument: &'static str, value: f64 },

    /// The buffer's rate differs from the stream rate.
    SampleRateMismatch { buffer: f64, stream: f64 },

    /// Channels passed to a source buffer have different lengths.
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// Interleaved data is not a whole number of frames.
    RaggedInterleaved { samples: usize, channels: usize },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::InvalidState { operation } => {
                write!(f, "{} is not valid in the current state", operation)
            }
            SourceError::NonFinite { argument, value } => {
                write!(f, "{} must be finite, got {}", argument, value)
            }
            SourceError::SampleRateMismatch { buffer, stream } => {
                write!(
                    f,
                    "buffer sample rate {} does not match stream rate {}",
                    buffer, stream
                )
            }
            SourceError::ChannelLengthMismatch {
                channel,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "channel {} has {} frames, expected {}",
                    channel, actual, expected
                )
            }
            SourceError::RaggedInterleaved { samples, channels } => {
                write!(
                    f,
                    "{} interleaved samples do not divide into {} channels",
                    samples, channels
                )
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Result type for control-side operations.
pub type SourceResult<T> = Result<T, SourceError>;
