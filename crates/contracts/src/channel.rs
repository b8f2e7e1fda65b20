//! ChannelSpec / ChannelMessage - Transport Bridge contracts
//!
//! Named pub/sub channels with per-channel quality-of-service policy.

use serde::{Deserialize, Serialize};

use crate::{SensorName, SensorSample, TransformTree};

/// Payload schema carried by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSchema {
    RangeImage,
    Inertial,
    PoseVelocity,
    /// Simulation clock heartbeat
    Clock,
    /// Static/kinematic reference-frame chain
    TransformTree,
}

/// Delivery guarantee class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Buffered/retried within the durability window
    #[default]
    Reliable,
    /// May drop under congestion without surfacing an error
    BestEffort,
}

/// Late-joiner visibility class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Only messages published after subscription are seen
    #[default]
    Volatile,
    /// The last `depth` messages are replayed to late subscribers
    Transient,
}

/// Per-channel quality-of-service policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosPolicy {
    #[serde(default)]
    pub reliability: Reliability,

    #[serde(default)]
    pub durability: Durability,

    /// History depth (queue capacity / transient replay window)
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    10
}

impl Default for QosPolicy {
    fn default() -> Self {
        Self {
            reliability: Reliability::default(),
            durability: Durability::default(),
            depth: default_depth(),
        }
    }
}

/// Immutable channel configuration, loaded once at bridge setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel (topic) name, e.g. "/camera/depth"
    pub name: String,

    /// Payload schema tag
    pub schema: ChannelSchema,

    /// Source sensor; None for clock and transform-tree channels
    #[serde(default)]
    pub source: Option<SensorName>,

    /// Quality-of-service policy
    #[serde(default)]
    pub qos: QosPolicy,

    /// Target publish rate (Hz); None publishes at the render-tick cadence
    #[serde(default)]
    pub target_rate_hz: Option<f64>,
}

/// Message header, simulation-time stamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Simulation time (seconds); wall clock never appears on the wire
    pub sim_time: f64,

    /// Per-channel monotonically increasing sequence number
    pub seq: u64,

    /// Reference frame the payload is expressed in
    pub frame_id: String,
}

/// Kind-specific message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessagePayload {
    /// A sensor sample, validity flag included
    Sensor(SensorSample),

    /// Clock heartbeat
    Clock { sim_time: f64, render_tick: u64 },

    /// Reference-frame chain
    Transforms(TransformTree),
}

/// One message on a named channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub header: MessageHeader,
    pub payload: MessagePayload,
}
