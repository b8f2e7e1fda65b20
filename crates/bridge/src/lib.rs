//! # Bridge
//!
//! Transport bridge: republishes observation snapshots onto named pub/sub
//! channels under per-channel QoS, governed by a small state machine
//! (uninitialized → bridging → torn down).
//!
//! The middleware behind the bridge is abstracted by the `Transport` trait;
//! this crate ships an in-process `LoopbackTransport` realization and an
//! `OfflineTransport` that models an unavailable middleware (the bridge
//! degrades to a no-op publisher rather than failing the environment).

mod codec;
mod handle;
mod loopback;
mod state;
mod transport_bridge;

pub use codec::{decode_message, encode_message};
pub use handle::{ChannelHandle, PublishOutcome};
pub use loopback::{LoopbackSubscriber, LoopbackTransport, OfflineTransport};
pub use state::BridgeState;
pub use transport_bridge::{BridgeConfig, PublishContext, TransportBridge};
