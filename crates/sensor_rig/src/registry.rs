//! Sensor registry: owns configured sensor instances and drives them at the
//! clock's cadence.

use contracts::{EnvError, SensorSpec};
use tracing::{debug, instrument};

use crate::sensors::{build_sensor, Sensor, WorldView};

/// Registry of configured sensors.
///
/// Iterated each physics tick for native-rate integration and each render
/// tick for publish-rate refreshes; only due sensors are refreshed, which is
/// how distinct sensors run at distinct multiples of the base render rate.
pub struct SensorRegistry {
    sensors: Vec<Box<dyn Sensor>>,
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

impl SensorRegistry {
    /// Build sensor instances from validated specs.
    ///
    /// # Errors
    /// Configuration error for duplicate names, non-positive rates, or
    /// missing kind-specific parameters.
    pub fn from_specs(specs: &[SensorSpec]) -> Result<Self, EnvError> {
        let mut sensors: Vec<Box<dyn Sensor>> = Vec::with_capacity(specs.len());
        for spec in specs {
            if !(spec.rate_hz > 0.0) {
                return Err(EnvError::config_validation(
                    format!("sensors[{}].rate_hz", spec.name),
                    format!("rate_hz must be > 0, got {}", spec.rate_hz),
                ));
            }
            if sensors.iter().any(|s| s.spec().name == spec.name) {
                return Err(EnvError::config_validation(
                    format!("sensors[{}]", spec.name),
                    "duplicate sensor name",
                ));
            }
            if !spec.enabled {
                debug!(sensor = %spec.name, "sensor disabled, skipping");
                continue;
            }
            sensors.push(build_sensor(spec)?);
        }
        debug!(count = sensors.len(), "sensor registry built");
        Ok(Self { sensors })
    }

    /// Native-rate pass, called every physics tick.
    pub fn integrate_all(&mut self, now: f64, view: &WorldView<'_>) {
        for sensor in &mut self.sensors {
            sensor.integrate(now, view);
        }
    }

    /// Publish-rate pass, called on render ticks; refreshes only due
    /// sensors and returns how many were refreshed.
    #[instrument(name = "registry_refresh_due", level = "trace", skip(self, view))]
    pub fn refresh_due(&mut self, now: f64, view: &WorldView<'_>) -> usize {
        let mut refreshed = 0;
        for sensor in &mut self.sensors {
            if sensor.is_due(now) {
                sensor.refresh(now, view);
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Reset every sensor for a new episode.
    #[instrument(name = "registry_reset", skip(self))]
    pub fn reset(&mut self, episode_seed: u64) {
        for sensor in &mut self.sensors {
            sensor.reset(episode_seed);
        }
    }

    /// Iterate sensors (registry retains ownership).
    pub fn iter(&self) -> impl Iterator<Item = &dyn Sensor> {
        self.sensors.iter().map(|s| s.as_ref())
    }

    /// Configured sensor count
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True when no sensors are configured
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{NoiseModel, Pose, RangeLimits, SensorKind};

    fn spec(name: &str, kind: SensorKind, rate_hz: f64) -> SensorSpec {
        SensorSpec {
            name: name.into(),
            kind,
            enabled: true,
            rate_hz,
            publish_rate_hz: None,
            mount: Pose::IDENTITY,
            noise: NoiseModel::None,
            limits: RangeLimits::default(),
            image: None,
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let specs = vec![
            spec("odom", SensorKind::PoseVelocity, 20.0),
            spec("odom", SensorKind::Inertial, 100.0),
        ];
        let result = SensorRegistry::from_specs(&specs);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate"), "got: {err}");
    }

    #[test]
    fn non_positive_rate_rejected() {
        let specs = vec![spec("imu", SensorKind::Inertial, 0.0)];
        assert!(SensorRegistry::from_specs(&specs).is_err());
    }

    #[test]
    fn range_image_without_geometry_rejected() {
        let specs = vec![spec("cam", SensorKind::RangeImage, 20.0)];
        assert!(SensorRegistry::from_specs(&specs).is_err());
    }

    #[test]
    fn disabled_sensors_are_not_instantiated() {
        let mut disabled = spec("imu", SensorKind::Inertial, 100.0);
        disabled.enabled = false;
        let specs = vec![disabled, spec("odom", SensorKind::PoseVelocity, 20.0)];
        let registry = SensorRegistry::from_specs(&specs).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().next().unwrap().spec().name, "odom");
    }

    #[test]
    fn builds_mixed_registry() {
        let specs = vec![
            spec("imu", SensorKind::Inertial, 100.0),
            spec("odom", SensorKind::PoseVelocity, 20.0),
        ];
        let registry = SensorRegistry::from_specs(&specs).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
