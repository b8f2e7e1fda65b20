//! Offline episode demo: unavailable middleware, degraded bridge.
//!
//! The transport refuses every publisher, so the bridge runs as a no-op;
//! observations still reach the caller with identical contents.
//!
//! Usage: cargo run --bin offline_episode

use bridge::OfflineTransport;
use environment::EnvironmentController;
use sim_core::ProceduralSceneProvider;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let blueprint = config_loader::ConfigLoader::load_from_path(std::path::Path::new("env.toml"))?;

    let mut env =
        EnvironmentController::new(blueprint, ProceduralSceneProvider::new(), OfflineTransport);

    env.initialize().await?;
    let initial = env.reset("warehouse", 7).await?;
    info!(
        sensors = initial.samples.len(),
        "reset complete without transport connectivity"
    );

    let mut complete = 0u64;
    for _ in 0..200 {
        let snapshot = env.step().await?;
        if snapshot.complete {
            complete += 1;
        }
    }

    let stats = env.stats();
    env.close().await;

    info!(
        steps = stats.steps,
        complete_snapshots = complete,
        degradations = stats.degradations,
        "offline episode complete; observations flowed throughout"
    );
    Ok(())
}
