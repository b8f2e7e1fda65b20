//! EnvBlueprint - Config Loader output
//!
//! Describes the complete environment configuration: clock rates, scene
//! defaults, sensor table, channel table.

use serde::{Deserialize, Serialize};

use crate::{ChannelSpec, SensorSpec};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete environment blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Clock and stepping settings
    pub simulation: SimulationConfig,

    /// Default scene selection
    #[serde(default)]
    pub scene: SceneDefaults,

    /// Sensor table
    pub sensors: Vec<SensorSpec>,

    /// Channel table
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

/// Clock and stepping settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fixed physics step (seconds)
    #[serde(default = "default_physics_dt")]
    pub physics_dt: f64,

    /// Fixed render/sensor step (seconds); must be an integer multiple
    /// of the physics step
    #[serde(default = "default_render_dt")]
    pub render_dt: f64,

    /// Reliable-channel publish timeout (seconds); defaults to the
    /// render period
    #[serde(default)]
    pub publish_timeout_s: Option<f64>,
}

fn default_physics_dt() -> f64 {
    0.01 // 100 Hz
}

fn default_render_dt() -> f64 {
    0.05 // 20 Hz
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics_dt: default_physics_dt(),
            render_dt: default_render_dt(),
            publish_timeout_s: None,
        }
    }
}

impl SimulationConfig {
    /// Effective reliable-channel publish timeout
    pub fn publish_timeout(&self) -> f64 {
        self.publish_timeout_s.unwrap_or(self.render_dt)
    }
}

/// Default scene selection for `reset()` calls that omit one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDefaults {
    /// Scene family, e.g. "office"
    #[serde(default = "default_scene_family")]
    pub family: String,

    /// Scene generation seed
    #[serde(default = "default_scene_seed")]
    pub seed: u64,
}

fn default_scene_family() -> String {
    "office".to_string()
}

fn default_scene_seed() -> u64 {
    42
}

impl Default for SceneDefaults {
    fn default() -> Self {
        Self {
            family: default_scene_family(),
            seed: default_scene_seed(),
        }
    }
}

impl EnvBlueprint {
    /// Look up a sensor spec by name
    pub fn sensor(&self, name: &str) -> Option<&SensorSpec> {
        self.sensors.iter().find(|s| s.name == name)
    }

    /// Channels sourced from a given sensor
    pub fn channels_for<'a>(&'a self, sensor: &'a str) -> impl Iterator<Item = &'a ChannelSpec> + 'a {
        self.channels
            .iter()
            .filter(move |c| c.source.as_deref() == Some(sensor))
    }

    /// The slowest publish period among enabled sensors (seconds).
    /// The transform-tree channel is keyed to this cadence to bound
    /// bandwidth.
    pub fn slowest_publish_period(&self) -> f64 {
        self.sensors
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.publish_period())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelSchema, NoiseModel, Pose, RangeLimits, SensorKind};

    fn sample_sensor(name: &str, kind: SensorKind, rate_hz: f64) -> SensorSpec {
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

    fn sample_blueprint() -> EnvBlueprint {
        EnvBlueprint {
            version: ConfigVersion::V1,
            simulation: SimulationConfig::default(),
            scene: SceneDefaults::default(),
            sensors: vec![
                sample_sensor("depth_camera", SensorKind::RangeImage, 20.0),
                sample_sensor("imu", SensorKind::Inertial, 100.0),
                sample_sensor("odom", SensorKind::PoseVelocity, 20.0),
            ],
            channels: vec![ChannelSpec {
                name: "/imu/data".into(),
                schema: ChannelSchema::Inertial,
                source: Some("imu".into()),
                qos: Default::default(),
                target_rate_hz: Some(20.0),
            }],
        }
    }

    #[test]
    fn publish_timeout_defaults_to_render_period() {
        let sim = SimulationConfig::default();
        assert_eq!(sim.publish_timeout(), sim.render_dt);
    }

    #[test]
    fn slowest_publish_period_picks_max() {
        let bp = sample_blueprint();
        // camera and odom both run at 20 Hz; imu publishes at native 100 Hz
        assert!((bp.slowest_publish_period() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn channels_for_filters_by_source() {
        let bp = sample_blueprint();
        assert_eq!(bp.channels_for("imu").count(), 1);
        assert_eq!(bp.channels_for("odom").count(), 0);
    }
}
