//! # Sim Core
//!
//! Simulation clock, ground-truth physics context, and scene provider.
//!
//! Responsibilities:
//! - Own simulation time and the physics/render tick cadence
//! - Advance the deterministic ground-truth body state
//! - Load deterministic scenes keyed by (scene_id, seed)

mod clock;
pub mod convert;
mod physics;
mod scene;

pub use clock::SimClock;
pub use physics::{GroundTruth, PhysicsContext, GRAVITY};
pub use scene::{ProceduralSceneProvider, SceneHandle, SceneProvider};
