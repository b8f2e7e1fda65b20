//! Ground-truth physics context.
//!
//! The body flies a fixed analytic trajectory (a slow circular drift from
//! the spawn pose). State is evaluated from absolute simulation time rather
//! than integrated, so equal (scene, seed) episodes are bit-identical.

use contracts::{Pose, Quaternion, Vector3};

use crate::convert::unit_quat;

/// Standard gravity (m/s²), +Z up
pub const GRAVITY: f64 = 9.81;

/// Drift radius (meters)
const DRIFT_RADIUS: f64 = 0.5;

/// Drift angular rate (rad/s)
const DRIFT_OMEGA: f64 = 0.2;

/// World-frame kinematic state of the simulated body.
///
/// Owned exclusively by the physics context; sensors receive shared
/// references and consumers only ever see copies inside snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth {
    /// Body pose in the world frame
    pub pose: Pose,

    /// Linear velocity (m/s), world frame
    pub lin_vel: Vector3,

    /// Angular velocity (rad/s), world frame
    pub ang_vel: Vector3,

    /// Linear acceleration (m/s²), world frame, gravity excluded
    pub lin_accel: Vector3,
}

impl GroundTruth {
    fn at_rest(pose: Pose) -> Self {
        Self {
            pose,
            lin_vel: Vector3::ZERO,
            ang_vel: Vector3::ZERO,
            lin_accel: Vector3::ZERO,
        }
    }
}

/// Deterministic physics/render context wrapper.
#[derive(Debug, Clone)]
pub struct PhysicsContext {
    spawn: Pose,
    spawn_yaw: f64,
    truth: GroundTruth,
}

impl PhysicsContext {
    /// Construct a context parked at the given spawn pose.
    pub fn new(spawn: Pose) -> Self {
        let spawn_yaw = yaw_of(&spawn.rotation);
        Self {
            spawn,
            spawn_yaw,
            truth: GroundTruth::at_rest(spawn),
        }
    }

    /// Re-seat the body at a new spawn pose (episode reset).
    pub fn reset(&mut self, spawn: Pose) {
        self.spawn_yaw = yaw_of(&spawn.rotation);
        self.spawn = spawn;
        self.truth = GroundTruth::at_rest(spawn);
    }

    /// Evaluate the trajectory at absolute simulation time `t`.
    pub fn advance_to(&mut self, t: f64) -> &GroundTruth {
        let (w, r) = (DRIFT_OMEGA, DRIFT_RADIUS);
        let (sin_wt, cos_wt) = (w * t).sin_cos();

        let base = self.spawn.translation;
        self.truth.pose.translation = Vector3::new(
            base.x + r * sin_wt,
            base.y + r * (1.0 - cos_wt),
            base.z,
        );
        self.truth.pose.rotation = Quaternion::from_yaw(self.spawn_yaw + w * t);
        self.truth.lin_vel = Vector3::new(r * w * cos_wt, r * w * sin_wt, 0.0);
        self.truth.lin_accel = Vector3::new(-r * w * w * sin_wt, r * w * w * cos_wt, 0.0);
        self.truth.ang_vel = Vector3::new(0.0, 0.0, w);
        &self.truth
    }

    /// Current ground-truth state
    pub fn truth(&self) -> &GroundTruth {
        &self.truth
    }
}

fn yaw_of(q: &Quaternion) -> f64 {
    unit_quat(q).euler_angles().2
}
