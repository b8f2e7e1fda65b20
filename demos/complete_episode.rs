//! Complete episode demo: environment + loopback transport + subscriber.
//!
//! Runs one episode against the in-process transport while a subscriber
//! task consumes the /imu/data channel, demonstrating the full path from
//! ground truth to decoded wire messages.
//!
//! Usage: cargo run --bin complete_episode

use bridge::LoopbackTransport;
use contracts::MessagePayload;
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

    let transport = LoopbackTransport::new();
    let mut env = EnvironmentController::new(
        blueprint,
        ProceduralSceneProvider::new(),
        transport.clone(),
    );

    env.initialize().await?;
    env.reset("office", 42).await?;

    // consume the IMU stream concurrently with stepping
    let mut imu_sub = transport.subscribe("/imu/data").expect("channel exists");
    let subscriber = tokio::spawn(async move {
        let mut received = 0u64;
        while let Some(message) = imu_sub.recv().await {
            if let MessagePayload::Sensor(sample) = &message.payload {
                if sample.valid {
                    received += 1;
                    if received % 20 == 0 {
                        info!(
                            sim_time = message.header.sim_time,
                            seq = message.header.seq,
                            "imu messages received: {received}"
                        );
                    }
                }
            }
        }
        received
    });

    // 10 seconds of simulation at 100 Hz
    for _ in 0..1000 {
        let snapshot = env.step().await?;
        observability::record_step_metrics(&snapshot);
    }

    let stats = env.stats();
    env.close().await;
    // release every transport handle so the subscriber stream ends
    drop(env);
    drop(transport);

    let received = subscriber.await?;
    info!(
        steps = stats.steps,
        degradations = stats.degradations,
        imu_messages = received,
        "episode complete"
    );
    Ok(())
}
