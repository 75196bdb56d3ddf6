// src/loop_state.rs

/// Loop progress of one playback session.
///
/// Transitions:
///
/// | From         | Event                                   | To           |
/// |--------------|-----------------------------------------|--------------|
/// | any          | new session, loop enabled and valid     | `WillLoop`   |
/// | any          | new session, otherwise                  | `NotLooping` |
/// | `WillLoop`   | quantum ends at or past the loop bound  | `IsLooping`  |
/// | `NotLooping` | quantum produced                        | `NotLooping` |
/// | `IsLooping`  | quantum produced                        | `IsLooping`  |
///
/// Within a session the state only moves forward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    /// Will never loop.
    #[default]
    NotLooping,
    /// In loop mode, but the loop end has not been reached yet.
    WillLoop,
    /// Wrapped into the loop region at least once.
    IsLooping,
}

impl LoopState {
    /// Initial state of a fresh session.
    #[inline]
    pub fn for_session(loop_enabled: bool) -> Self {
        if loop_enabled {
            LoopState::WillLoop
        } else {
            LoopState::NotLooping
        }
    }

    /// State after producing a quantum ending at `quantum_end`.
    #[inline]
    pub fn after_quantum(self, quantum_end: u64, loop_boundary: u64) -> Self {
        match self {
            LoopState::WillLoop if quantum_end >= loop_boundary => LoopState::IsLooping,
            other => other,
        }
    }

    /// True in either loop-mode state.
    #[inline]
    pub fn is_loop_mode(self) -> bool {
        self != LoopState::NotLooping
    }
}
