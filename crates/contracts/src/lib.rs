//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Simulation time (seconds, f64) is the only clock; wall clock is never consulted
//! - Time advances exclusively through the simulation clock's physics tick

mod blueprint;
mod channel;
mod error;
mod frames;
mod geometry;
mod sensor;
mod sensor_name;
mod snapshot;
mod transport;

pub use blueprint::*;
pub use channel::*;
pub use error::*;
pub use frames::*;
pub use geometry::*;
pub use sensor::*;
pub use sensor_name::SensorName;
pub use snapshot::*;
pub use transport::{ChannelPublisher, Transport};
