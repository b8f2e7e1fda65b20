//! SensorSpec / SensorSample - Sensor Rig contracts
//!
//! Closed set of sensor kinds with fixed, immutable per-kind configuration.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Pose, Quaternion, SensorName, Vector3};

/// Sensor kind (closed set; the registry dispatches on this)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Depth/range image camera
    RangeImage,
    /// Linear acceleration + angular velocity
    Inertial,
    /// Ground-truth pose, velocity and orientation
    PoseVelocity,
}

/// Immutable sensor configuration
///
/// Owned by the sensor registry; frozen after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Unique sensor name
    pub name: SensorName,

    /// Sensor kind
    pub kind: SensorKind,

    /// Disabled sensors are configured but never instantiated; they do not
    /// appear in snapshots
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Native update rate (Hz)
    pub rate_hz: f64,

    /// Rate at which samples are surfaced to the assembler (Hz).
    /// Defaults to the native rate. An inertial channel typically runs
    /// 100 Hz native with a 20 Hz publish rate.
    #[serde(default)]
    pub publish_rate_hz: Option<f64>,

    /// Mount pose relative to the body frame
    pub mount: Pose,

    /// Noise strategy applied after the ground-truth transform
    #[serde(default)]
    pub noise: NoiseModel,

    /// Valid payload magnitude bounds
    #[serde(default)]
    pub limits: RangeLimits,

    /// Range-image geometry; required when kind == RangeImage
    #[serde(default)]
    pub image: Option<RangeImageParams>,
}

fn default_enabled() -> bool {
    true
}

impl SensorSpec {
    /// Native sampling period (seconds)
    pub fn native_period(&self) -> f64 {
        1.0 / self.rate_hz
    }

    /// Period gating what reaches the observation assembler (seconds)
    pub fn publish_period(&self) -> f64 {
        1.0 / self.publish_rate_hz.unwrap_or(self.rate_hz)
    }
}

/// Noise strategy, configured per sensor rather than hard-coded per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum NoiseModel {
    /// Pass ground truth through untouched
    #[default]
    None,

    /// Additive zero-mean Gaussian noise
    Gaussian { sigma: f64 },

    /// Constant bias plus bounded random walk plus Gaussian noise
    BiasRandomWalk {
        bias: f64,
        sigma: f64,
        walk_sigma: f64,
    },
}

/// Valid magnitude bounds for a payload
///
/// Values outside the bounds are reported invalid, never clipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for RangeLimits {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }
}

impl RangeLimits {
    /// Whether a magnitude falls inside the valid band
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Range-image camera geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeImageParams {
    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    /// Horizontal field of view (degrees)
    #[serde(default = "default_fov_deg")]
    pub fov_deg: f64,
}

fn default_fov_deg() -> f64 {
    90.0
}

impl RangeImageParams {
    /// Pinhole intrinsics derived from the field of view
    pub fn intrinsics(&self) -> CameraIntrinsics {
        let w = self.width as f64;
        let h = self.height as f64;
        let fx = (w / 2.0) / (self.fov_deg.to_radians() / 2.0).tan();
        CameraIntrinsics {
            fx,
            fy: fx,
            cx: w / 2.0,
            cy: h / 2.0,
        }
    }
}

/// Pinhole camera intrinsics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Kind-specific sensor payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorPayload {
    /// Depth image buffer plus intrinsics
    RangeImage(RangeImageData),

    /// Linear acceleration / angular velocity pair
    Inertial(InertialData),

    /// Position / velocity / orientation tuple
    PoseVelocity(PoseVelocityData),
}

impl SensorPayload {
    /// The kind this payload belongs to
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::RangeImage(_) => SensorKind::RangeImage,
            Self::Inertial(_) => SensorKind::Inertial,
            Self::PoseVelocity(_) => SensorKind::PoseVelocity,
        }
    }
}

/// Depth image data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeImageData {
    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    /// Pinhole intrinsics
    pub intrinsics: CameraIntrinsics,

    /// Row-major f32 little-endian depths (meters); out-of-range
    /// pixels carry +inf
    pub data: Bytes,
}

impl RangeImageData {
    /// Decode the depth buffer into f32 values
    pub fn depths(&self) -> Vec<f32> {
        self.data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

/// Inertial data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialData {
    /// Linear acceleration (m/s²), body frame
    pub lin_accel: Vector3,

    /// Angular velocity (rad/s), body frame
    pub ang_vel: Vector3,

    /// Native-rate updates folded into this sample since the last publish
    pub integration_steps: u32,
}

/// Pose/velocity data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseVelocityData {
    /// Position (meters), world frame
    pub position: Vector3,

    /// Linear velocity (m/s), world frame
    pub velocity: Vector3,

    /// Orientation (unit quaternion), world frame
    pub orientation: Quaternion,
}

/// One sensor's latest reading
///
/// Created invalid at sensor construction, overwritten in place on each due
/// update, cleared back to invalid on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Simulation time of the last update
    pub timestamp: f64,

    /// False until the first due update after reset, or when the payload
    /// fell outside the sensor's valid range
    pub valid: bool,

    /// Kind-specific payload
    pub payload: SensorPayload,
}

impl SensorSample {
    /// Initial sample: invalid, timestamped at zero
    pub fn initial(payload: SensorPayload) -> Self {
        Self {
            timestamp: 0.0,
            valid: false,
            payload,
        }
    }
}
