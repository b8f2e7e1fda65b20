//! Configuration validation.
//!
//! Rules:
//! - sensor names unique, rates > 0, publish rate <= native rate
//! - render_dt an integer multiple of physics_dt
//! - range_image sensors carry image geometry
//! - mount rotations are unit quaternions
//! - channel names unique and non-empty; sensor-schema channels resolve
//!   their source and match its kind

use std::collections::HashSet;

use contracts::{ChannelSchema, EnvBlueprint, EnvError, SensorKind};

/// Quaternion norm tolerance for mount rotations
const UNIT_QUAT_TOLERANCE: f64 = 1e-6;

/// Validate an EnvBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &EnvBlueprint) -> Result<(), EnvError> {
    validate_simulation(blueprint)?;
    validate_sensors(blueprint)?;
    validate_channels(blueprint)?;
    Ok(())
}

/// Validate the clock relationship
fn validate_simulation(blueprint: &EnvBlueprint) -> Result<(), EnvError> {
    let sim = &blueprint.simulation;
    if sim.physics_dt <= 0.0 || sim.render_dt <= 0.0 {
        return Err(EnvError::config_validation(
            "simulation",
            format!(
                "physics_dt ({}) and render_dt ({}) must be > 0",
                sim.physics_dt, sim.render_dt
            ),
        ));
    }

    let ratio = sim.render_dt / sim.physics_dt;
    if (ratio - ratio.round()).abs() > 1e-9 * ratio || ratio.round() < 1.0 {
        return Err(EnvError::config_validation(
            "simulation.render_dt",
            format!(
                "render_dt ({}) must be a positive integer multiple of physics_dt ({})",
                sim.render_dt, sim.physics_dt
            ),
        ));
    }

    if let Some(timeout) = sim.publish_timeout_s {
        if timeout <= 0.0 {
            return Err(EnvError::config_validation(
                "simulation.publish_timeout_s",
                format!("publish timeout must be > 0, got {timeout}"),
            ));
        }
    }
    Ok(())
}

/// Validate the sensor table
fn validate_sensors(blueprint: &EnvBlueprint) -> Result<(), EnvError> {
    if blueprint.sensors.is_empty() {
        return Err(EnvError::config_validation(
            "sensors",
            "at least one sensor must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for sensor in &blueprint.sensors {
        if sensor.name.is_empty() {
            return Err(EnvError::config_validation(
                "sensors[].name",
                "sensor name cannot be empty",
            ));
        }
        if !seen.insert(sensor.name.as_str().to_string()) {
            return Err(EnvError::config_validation(
                format!("sensors[{}]", sensor.name),
                "duplicate sensor name",
            ));
        }

        if sensor.rate_hz <= 0.0 {
            return Err(EnvError::config_validation(
                format!("sensors[{}].rate_hz", sensor.name),
                format!("rate_hz must be > 0, got {}", sensor.rate_hz),
            ));
        }
        if let Some(publish) = sensor.publish_rate_hz {
            if publish <= 0.0 || publish > sensor.rate_hz {
                return Err(EnvError::config_validation(
                    format!("sensors[{}].publish_rate_hz", sensor.name),
                    format!(
                        "publish_rate_hz ({publish}) must be in (0, rate_hz = {}]",
                        sensor.rate_hz
                    ),
                ));
            }
        }

        if sensor.kind == SensorKind::RangeImage && sensor.image.is_none() {
            return Err(EnvError::config_validation(
                format!("sensors[{}].image", sensor.name),
                "range_image sensors require image geometry",
            ));
        }
        if let Some(image) = &sensor.image {
            if image.width == 0 || image.height == 0 {
                return Err(EnvError::config_validation(
                    format!("sensors[{}].image", sensor.name),
                    "image dimensions must be non-zero",
                ));
            }
            if image.fov_deg <= 0.0 || image.fov_deg >= 180.0 {
                return Err(EnvError::config_validation(
                    format!("sensors[{}].image.fov_deg", sensor.name),
                    format!("fov_deg must be in (0, 180), got {}", image.fov_deg),
                ));
            }
        }

        if sensor.limits.min > sensor.limits.max {
            return Err(EnvError::config_validation(
                format!("sensors[{}].limits", sensor.name),
                format!(
                    "limits.min ({}) must be <= limits.max ({})",
                    sensor.limits.min, sensor.limits.max
                ),
            ));
        }

        let norm_sq = sensor.mount.rotation.norm_squared();
        if (norm_sq - 1.0).abs() > UNIT_QUAT_TOLERANCE {
            return Err(EnvError::config_validation(
                format!("sensors[{}].mount.rotation", sensor.name),
                format!("mount rotation must be a unit quaternion (norm² = {norm_sq})"),
            ));
        }
    }
    Ok(())
}

/// Validate the channel table
fn validate_channels(blueprint: &EnvBlueprint) -> Result<(), EnvError> {
    let sensor_kinds: std::collections::HashMap<&str, SensorKind> = blueprint
        .sensors
        .iter()
        .map(|s| (s.name.as_str(), s.kind))
        .collect();

    let mut seen = HashSet::new();
    for (idx, channel) in blueprint.channels.iter().enumerate() {
        if channel.name.is_empty() {
            return Err(EnvError::config_validation(
                format!("channels[{idx}].name"),
                "channel name cannot be empty",
            ));
        }
        if !seen.insert(channel.name.as_str()) {
            return Err(EnvError::config_validation(
                format!("channels[{}]", channel.name),
                "duplicate channel name",
            ));
        }

        if let Some(rate) = channel.target_rate_hz {
            if rate <= 0.0 {
                return Err(EnvError::config_validation(
                    format!("channels[{}].target_rate_hz", channel.name),
                    format!("target_rate_hz must be > 0, got {rate}"),
                ));
            }
        }

        let expected_kind = match channel.schema {
            ChannelSchema::RangeImage => Some(SensorKind::RangeImage),
            ChannelSchema::Inertial => Some(SensorKind::Inertial),
            ChannelSchema::PoseVelocity => Some(SensorKind::PoseVelocity),
            ChannelSchema::Clock | ChannelSchema::TransformTree => None,
        };

        match expected_kind {
            Some(kind) => {
                let source = channel.source.as_ref().ok_or_else(|| {
                    EnvError::config_validation(
                        format!("channels[{}].source", channel.name),
                        "sensor-schema channels require a source sensor",
                    )
                })?;
                match sensor_kinds.get(source.as_str()) {
                    None => {
                        return Err(EnvError::config_validation(
                            format!("channels[{}].source", channel.name),
                            format!("source sensor '{source}' not found"),
                        ));
                    }
                    Some(actual) if *actual != kind => {
                        return Err(EnvError::config_validation(
                            format!("channels[{}].schema", channel.name),
                            format!("schema does not match source sensor '{source}' kind"),
                        ));
                    }
                    Some(_) => {}
                }
            }
            None => {
                if channel.source.is_some() {
                    return Err(EnvError::config_validation(
                        format!("channels[{}].source", channel.name),
                        "clock/transform channels must not name a source sensor",
                    ));
                }
            }
        }
    }
    Ok(())
}
