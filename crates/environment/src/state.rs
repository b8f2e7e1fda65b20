//! Environment controller lifecycle states.

use std::fmt;

/// Controller lifecycle state.
///
/// `Constructed → Initialized → Ready → Closed`; `Ready` loops on `step()`
/// and re-enters itself on `reset()`. A failed scene load drops `Ready`
/// back to `Initialized` so the caller may retry with other parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    /// Dependencies injected, nothing built yet
    Constructed,
    /// Clock, sensors and bridge are up; no episode loaded
    Initialized,
    /// Episode loaded, stepping legal
    Ready,
    /// Torn down; terminal
    Closed,
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constructed => "constructed",
            Self::Initialized => "initialized",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
