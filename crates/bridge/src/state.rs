//! Bridge lifecycle state machine.

use std::fmt;

/// Transport bridge state.
///
/// Transitions are linear and one-directional, except that `Bridging`
/// survives a reset (the bridge drains in place). `ShuttingDown` is a
/// transient sub-state entered during in-flight publish draining on
/// teardown and is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Constructed, no channels yet
    Uninitialized,
    /// Channels set up, publishing legal
    Bridging,
    /// Teardown started, draining in-flight publishes
    ShuttingDown,
    /// Torn down; terminal
    Closed,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Bridging => "bridging",
            Self::ShuttingDown => "shutting_down",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
