//! Plain geometric value types shared across crate boundaries.
//!
//! These stay dependency-free on purpose; heavier math happens inside the
//! simulation crates with nalgebra and converts at the boundary.

use serde::{Deserialize, Serialize};

/// 3D vector (meters or meters/second depending on context)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new vector
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Unit quaternion, scalar-first (w, x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new quaternion (not normalized)
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Quaternion for a rotation of `yaw` radians about +Z
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw / 2.0;
        Self {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }

    /// Squared norm, used by the validator to reject non-unit mounts
    pub fn norm_squared(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid transform: translation then rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation (meters)
    pub translation: Vector3,

    /// Orientation (unit quaternion)
    #[serde(default)]
    pub rotation: Quaternion,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: Vector3::ZERO,
        rotation: Quaternion::IDENTITY,
    };

    /// Create a pose from translation with identity rotation
    pub fn from_translation(translation: Vector3) -> Self {
        Self {
            translation,
            rotation: Quaternion::IDENTITY,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_quaternion_is_unit() {
        let q = Quaternion::from_yaw(1.2);
        assert!((q.norm_squared() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pose_defaults_to_identity_rotation() {
        let json = r#"{"translation":{"x":1.0,"y":0.0,"z":0.5}}"#;
        let pose: Pose = serde_json::from_str(json).unwrap();
        assert_eq!(pose.rotation, Quaternion::IDENTITY);
    }
}
