//! # Environment
//!
//! Top-level simulation-environment lifecycle controller.
//!
//! Owns the strict initialization/reset/step/close state machine across the
//! clock, physics context, sensor registry, observation assembler, and
//! transport bridge. All dependencies are constructor-injected; there is no
//! process-wide simulation singleton.

mod controller;
mod state;

pub use controller::{EnvStats, EnvironmentController};
pub use state::EnvState;
