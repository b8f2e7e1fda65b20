//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::EnvBlueprint;

use crate::cli::InfoArgs;

/// Sensor details for JSON output
#[derive(Serialize)]
struct SensorInfo {
    name: String,
    kind: String,
    rate_hz: f64,
    publish_rate_hz: Option<f64>,
    noise: String,
}

/// Channel details for JSON output
#[derive(Serialize)]
struct ChannelInfo {
    name: String,
    schema: String,
    source: Option<String>,
    reliability: String,
    durability: String,
    depth: usize,
    target_rate_hz: Option<f64>,
}

#[derive(Serialize)]
struct ConfigInfo {
    config_path: String,
    physics_hz: f64,
    render_hz: f64,
    render_interval: u64,
    scene_family: String,
    scene_seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensors: Option<Vec<SensorInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<ChannelInfo>>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Reading configuration");

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let details = build_info(&blueprint, args);

    if args.json {
        let json = serde_json::to_string_pretty(&details).context("Failed to serialize info")?;
        println!("{}", json);
    } else {
        print_info(&details);
    }

    Ok(())
}

fn build_info(blueprint: &EnvBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sim = &blueprint.simulation;

    let sensors = (args.sensors || args.json).then(|| {
        blueprint
            .sensors
            .iter()
            .map(|s| SensorInfo {
                name: s.name.to_string(),
                kind: format!("{:?}", s.kind),
                rate_hz: s.rate_hz,
                publish_rate_hz: s.publish_rate_hz,
                noise: format!("{:?}", s.noise),
            })
            .collect()
    });

    let channels = (args.channels || args.json).then(|| {
        blueprint
            .channels
            .iter()
            .map(|c| ChannelInfo {
                name: c.name.clone(),
                schema: format!("{:?}", c.schema),
                source: c.source.as_ref().map(|s| s.to_string()),
                reliability: format!("{:?}", c.qos.reliability),
                durability: format!("{:?}", c.qos.durability),
                depth: c.qos.depth,
                target_rate_hz: c.target_rate_hz,
            })
            .collect()
    });

    ConfigInfo {
        config_path: args.config.display().to_string(),
        physics_hz: 1.0 / sim.physics_dt,
        render_hz: 1.0 / sim.render_dt,
        render_interval: (sim.render_dt / sim.physics_dt).round() as u64,
        scene_family: blueprint.scene.family.clone(),
        scene_seed: blueprint.scene.seed,
        sensors,
        channels,
    }
}

fn print_info(details: &ConfigInfo) {
    println!("\n=== Environment Configuration ===\n");
    println!("Config: {}", details.config_path);
    println!(
        "Clock: {:.0} Hz physics / {:.0} Hz render (interval {})",
        details.physics_hz, details.render_hz, details.render_interval
    );
    println!(
        "Scene: {} (seed {})",
        details.scene_family, details.scene_seed
    );

    if let Some(ref sensors) = details.sensors {
        println!("\nSensors ({}):", sensors.len());
        for sensor in sensors {
            let publish = sensor
                .publish_rate_hz
                .map(|r| format!(" -> {r:.0} Hz publish"))
                .unwrap_or_default();
            println!(
                "  - {} [{}] {:.0} Hz{publish}, noise: {}",
                sensor.name, sensor.kind, sensor.rate_hz, sensor.noise
            );
        }
    }

    if let Some(ref channels) = details.channels {
        println!("\nChannels ({}):", channels.len());
        for channel in channels {
            let source = channel
                .source
                .as_ref()
                .map(|s| format!(" from {s}"))
                .unwrap_or_default();
            println!(
                "  - {} [{}]{} ({}/{}, depth {})",
                channel.name,
                channel.schema,
                source,
                channel.reliability,
                channel.durability,
                channel.depth
            );
        }
    }

    println!();
}
