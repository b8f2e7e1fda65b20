//! Sensor trait and kind implementations.

mod inertial;
mod pose_velocity;
mod range;

pub use inertial::InertialSensor;
pub use pose_velocity::PoseVelocitySensor;
pub use range::RangeSensor;

use contracts::{EnvError, SensorKind, SensorSample, SensorSpec};
use sim_core::{GroundTruth, SceneHandle};

/// Tolerance for due-period comparisons on f64 simulation time
pub(crate) const DUE_TOLERANCE: f64 = 1e-9;

/// Read-only world state handed to sensors on update.
pub struct WorldView<'a> {
    /// Ground-truth body kinematics
    pub truth: &'a GroundTruth,

    /// Static scene geometry for range queries
    pub scene: &'a SceneHandle,
}

/// Uniform sensor capability.
///
/// Implemented by the closed set of sensor kinds; the registry owns boxed
/// instances and drives them at the clock's cadence.
pub trait Sensor: Send {
    /// Immutable configuration
    fn spec(&self) -> &SensorSpec;

    /// Native-rate internal update, called every physics tick.
    ///
    /// Kinds with high-rate internal state (inertial noise integration)
    /// accumulate here; others ignore it.
    fn integrate(&mut self, now: f64, view: &WorldView<'_>);

    /// True when the publish period has elapsed since the sample's timestamp.
    fn is_due(&self, now: f64) -> bool {
        now - self.sample().timestamp >= self.spec().publish_period() - DUE_TOLERANCE
    }

    /// Overwrite the sample from current ground truth: deterministic
    /// transform, then noise, then range validation.
    fn refresh(&mut self, now: f64, view: &WorldView<'_>);

    /// Latest sample; invalid until the first due update after reset.
    fn sample(&self) -> &SensorSample;

    /// Clear validity and zero accumulated bias/walk state.
    fn reset(&mut self, episode_seed: u64);
}

/// Build a sensor instance for a validated spec.
///
/// # Errors
/// Configuration error when kind-specific parameters are missing
/// (a range-image sensor without image geometry).
pub fn build_sensor(spec: &SensorSpec) -> Result<Box<dyn Sensor>, EnvError> {
    match spec.kind {
        SensorKind::RangeImage => Ok(Box::new(RangeSensor::new(spec.clone())?)),
        SensorKind::Inertial => Ok(Box::new(InertialSensor::new(spec.clone()))),
        SensorKind::PoseVelocity => Ok(Box::new(PoseVelocitySensor::new(spec.clone()))),
    }
}

/// Per-sensor RNG seed: episode seed mixed with the sensor name so equal
/// episodes replay identically while sensors stay decorrelated.
pub(crate) fn sensor_seed(episode_seed: u64, name: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    episode_seed ^ hash
}
