//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use bridge::{LoopbackTransport, OfflineTransport};
use contracts::{EnvBlueprint, Transport};
use environment::EnvironmentController;
use observability::EpisodeAggregator;
use sim_core::ProceduralSceneProvider;

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_episodes(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref scene) = args.scene {
        info!(scene = %scene, "Overriding scene family from CLI");
        blueprint.scene.family = scene.clone();
    }
    if let Some(seed) = args.seed {
        info!(seed, "Overriding scene seed from CLI");
        blueprint.scene.seed = seed;
    }

    info!(
        scene = %blueprint.scene.family,
        seed = blueprint.scene.seed,
        sensors = blueprint.sensors.len(),
        channels = blueprint.channels.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!(offline = args.offline, "Starting episodes...");

    tokio::select! {
        result = run_with_transport(blueprint, args) => {
            result?;
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping...");
        }
    }

    info!("Simbridge finished");
    Ok(())
}

/// Pick the transport realization and drive the episodes
async fn run_with_transport(blueprint: EnvBlueprint, args: &RunArgs) -> Result<()> {
    if args.offline {
        drive(blueprint, ProceduralSceneProvider::new(), OfflineTransport, args).await
    } else {
        drive(
            blueprint,
            ProceduralSceneProvider::new(),
            LoopbackTransport::new(),
            args,
        )
        .await
    }
}

/// Episode loop, generic over the transport middleware
async fn drive<T: Transport>(
    blueprint: EnvBlueprint,
    provider: ProceduralSceneProvider,
    transport: T,
    args: &RunArgs,
) -> Result<()> {
    let scene_family = blueprint.scene.family.clone();
    let base_seed = blueprint.scene.seed;

    let mut env = EnvironmentController::new(blueprint, provider, transport);
    env.initialize()
        .await
        .context("Environment initialization failed")?;

    for episode in 0..args.episodes {
        let seed = base_seed.wrapping_add(episode);
        let mut aggregator = EpisodeAggregator::new();

        let initial = env
            .reset(&scene_family, seed)
            .await
            .with_context(|| format!("Reset failed for scene '{scene_family}' seed {seed}"))?;
        aggregator.update(&initial);

        for _ in 0..args.steps {
            let snapshot = env.step().await.context("Step failed")?;
            observability::record_step_metrics(&snapshot);
            aggregator.update(&snapshot);
        }

        let summary = aggregator.summary();
        info!(
            episode,
            seed,
            steps = summary.steps,
            complete = summary.complete_snapshots,
            mean_completeness = format!("{:.3}", summary.mean_completeness),
            "Episode finished"
        );
    }

    let stats = env.stats();
    env.close().await;
    print_run_summary(&stats, args);

    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &EnvBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Simulation:");
    println!(
        "  Physics: {:.0} Hz, Render: {:.0} Hz",
        1.0 / blueprint.simulation.physics_dt,
        1.0 / blueprint.simulation.render_dt
    );
    println!(
        "  Publish timeout: {:.3}s",
        blueprint.simulation.publish_timeout()
    );
    println!(
        "\nScene: {} (seed {})",
        blueprint.scene.family, blueprint.scene.seed
    );

    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        let publish = sensor
            .publish_rate_hz
            .map(|r| format!(", publish {r:.0} Hz"))
            .unwrap_or_default();
        println!(
            "  - {} ({:?}) - {:.0} Hz{publish}",
            sensor.name, sensor.kind, sensor.rate_hz
        );
    }

    if !blueprint.channels.is_empty() {
        println!("\nChannels ({}):", blueprint.channels.len());
        for channel in &blueprint.channels {
            println!(
                "  - {} ({:?}, {:?}/{:?}, depth {})",
                channel.name,
                channel.schema,
                channel.qos.reliability,
                channel.qos.durability,
                channel.qos.depth
            );
        }
    }

    println!();
}

/// Print final run statistics
fn print_run_summary(stats: &environment::EnvStats, args: &RunArgs) {
    println!("\n=== Run Summary ===\n");
    println!("  Episodes: {}", stats.episodes);
    println!("  Steps: {}", stats.steps);
    println!("  Transport degradations: {}", stats.degradations);
    if args.offline {
        println!("  (offline mode: bridge ran as no-op publisher)");
    }
    println!();
}
