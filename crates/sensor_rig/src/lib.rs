//! # Sensor Rig
//!
//! Sensor registry and observation assembly.
//!
//! A closed set of sensor kinds (range image, inertial, pose-velocity) is
//! dispatched by the registry. Each sensor runs at its own native rate,
//! applies a configured noise strategy, and surfaces samples at its publish
//! rate. The assembler collapses the latest sample from every sensor into
//! one consistent per-step snapshot.

mod assembler;
mod noise;
mod registry;
mod sensors;

pub use assembler::ObservationAssembler;
pub use noise::NoiseChannel;
pub use registry::SensorRegistry;
pub use sensors::{Sensor, WorldView};
