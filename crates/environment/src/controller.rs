//! Environment controller - the top-level state machine.

use std::time::Duration;

use tracing::{info, instrument};

use bridge::{BridgeConfig, BridgeState, PublishContext, TransportBridge};
use contracts::{EnvBlueprint, EnvError, ObservationSnapshot, Transport};
use sensor_rig::{ObservationAssembler, SensorRegistry, WorldView};
use sim_core::{PhysicsContext, SceneHandle, SceneProvider, SimClock};

use crate::state::EnvState;

/// Components built at `initialize()` and torn down at `close()`
struct Runtime {
    clock: SimClock,
    physics: PhysicsContext,
    registry: SensorRegistry,
}

/// Counters surfaced to callers and the CLI
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvStats {
    /// Physics steps taken since initialize
    pub steps: u64,

    /// Episodes started (successful resets)
    pub episodes: u64,

    /// Non-fatal transport degradations observed by the bridge
    pub degradations: u64,
}

/// Top-level simulation-environment controller.
///
/// Initialization order is strict: clock → sensors → bridge. Reversing it
/// is treated as programmer error and the constructor-injected pieces make
/// the order explicit rather than hidden in global state.
pub struct EnvironmentController<T: Transport, P: SceneProvider> {
    blueprint: EnvBlueprint,
    transport: T,
    provider: P,
    state: EnvState,
    runtime: Option<Runtime>,
    scene: Option<SceneHandle>,
    bridge: TransportBridge,
    assembler: ObservationAssembler,
    steps: u64,
    episodes: u64,
}

impl<T: Transport, P: SceneProvider> EnvironmentController<T, P> {
    /// Inject dependencies; nothing is built until `initialize()`.
    pub fn new(blueprint: EnvBlueprint, provider: P, transport: T) -> Self {
        Self {
            blueprint,
            transport,
            provider,
            state: EnvState::Constructed,
            runtime: None,
            scene: None,
            bridge: TransportBridge::new(),
            assembler: ObservationAssembler::new(),
            steps: 0,
            episodes: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EnvState {
        self.state
    }

    /// Bridge lifecycle state
    pub fn bridge_state(&self) -> BridgeState {
        self.bridge.state()
    }

    /// Runtime counters
    pub fn stats(&self) -> EnvStats {
        EnvStats {
            steps: self.steps,
            episodes: self.episodes,
            degradations: self.bridge.degradation_count(),
        }
    }

    /// Construct the physics/render context, validate the clock
    /// relationship, build sensors, and set up the bridge — in that order.
    ///
    /// # Errors
    /// Sequencing error outside `Constructed`; configuration errors for a
    /// bad Δt ratio or malformed sensor specs. Transport unavailability is
    /// not an error (the bridge degrades to no-op).
    #[instrument(name = "env_initialize", skip(self))]
    pub async fn initialize(&mut self) -> Result<(), EnvError> {
        if self.state != EnvState::Constructed {
            return Err(EnvError::sequencing("initialize", self.state));
        }

        let clock = SimClock::new(&self.blueprint.simulation)?;
        let registry = SensorRegistry::from_specs(&self.blueprint.sensors)?;
        let physics = PhysicsContext::new(Default::default());

        let mounts: Vec<_> = self
            .blueprint
            .sensors
            .iter()
            .filter(|s| s.enabled)
            .map(|s| (s.name.clone(), s.mount))
            .collect();
        let tf_period = self
            .blueprint
            .slowest_publish_period()
            .max(clock.render_dt());
        self.bridge.setup(
            &self.transport,
            &self.blueprint.channels,
            &mounts,
            BridgeConfig {
                publish_timeout: Duration::from_secs_f64(
                    self.blueprint.simulation.publish_timeout(),
                ),
                tf_period,
            },
        )?;

        info!(
            physics_hz = 1.0 / clock.physics_dt(),
            render_hz = 1.0 / clock.render_dt(),
            sensors = registry.len(),
            channels = self.bridge.active_channels(),
            "environment initialized"
        );

        self.runtime = Some(Runtime {
            clock,
            physics,
            registry,
        });
        self.state = EnvState::Initialized;
        Ok(())
    }

    /// Load a deterministic scene keyed by (scene_id, seed), reset the
    /// clock and every sensor, and perform exactly one assemble+publish
    /// cycle for the initial observation.
    ///
    /// # Errors
    /// Sequencing error outside `Initialized`/`Ready`. Scene errors are
    /// fatal for this call only: the controller drops to `Initialized` so
    /// the caller may retry with different parameters.
    #[instrument(name = "env_reset", skip(self))]
    pub async fn reset(
        &mut self,
        scene_id: &str,
        seed: u64,
    ) -> Result<ObservationSnapshot, EnvError> {
        if !matches!(self.state, EnvState::Initialized | EnvState::Ready) {
            return Err(EnvError::sequencing("reset", self.state));
        }

        let scene = match self.provider.load(scene_id, seed) {
            Ok(scene) => scene,
            Err(e) => {
                self.state = EnvState::Initialized;
                return Err(e);
            }
        };

        // a stale reliable-channel retransmission must not bleed into the
        // new episode's stream
        self.bridge.drain().await;

        let runtime = self.runtime.as_mut().expect("runtime exists in Initialized");
        runtime.clock.reset();
        runtime.physics.reset(scene.spawn_pose());
        runtime.registry.reset(seed);
        runtime.physics.advance_to(0.0);

        let snapshot = self.assembler.assemble(0.0, &runtime.registry);
        let ctx = PublishContext {
            sim_time: 0.0,
            render_due: true,
            render_tick: 0,
            body_pose: &runtime.physics.truth().pose,
        };
        self.bridge.publish(&snapshot, &ctx).await?;

        self.episodes += 1;
        metrics::counter!("env_episodes_total").increment(1);
        info!(scene_id, seed, "episode reset");

        self.scene = Some(scene);
        self.state = EnvState::Ready;
        Ok(snapshot)
    }

    /// Advance one physics tick: update due sensors, assemble, publish,
    /// and return the snapshot.
    ///
    /// # Errors
    /// Sequencing error outside `Ready`. Transport trouble never fails a
    /// step; it shows up in `stats().degradations` instead.
    #[instrument(name = "env_step", level = "debug", skip(self))]
    pub async fn step(&mut self) -> Result<ObservationSnapshot, EnvError> {
        if self.state != EnvState::Ready {
            return Err(EnvError::sequencing("step", self.state));
        }

        let runtime = self.runtime.as_mut().expect("runtime exists in Ready");
        let scene = self.scene.as_ref().expect("scene exists in Ready");

        let now = runtime.clock.advance();
        let render_due = runtime.clock.due_render_tick();

        let truth = runtime.physics.advance_to(now).clone();
        let view = WorldView {
            truth: &truth,
            scene,
        };

        runtime.registry.integrate_all(now, &view);
        if render_due {
            runtime.registry.refresh_due(now, &view);
        }

        let snapshot = self.assembler.assemble(now, &runtime.registry);

        let ctx = PublishContext {
            sim_time: now,
            render_due,
            render_tick: runtime.clock.render_tick_index(),
            body_pose: &truth.pose,
        };
        self.bridge.publish(&snapshot, &ctx).await?;

        self.steps += 1;
        Ok(snapshot)
    }

    /// Drain the bridge, release sensors, and tear down the physics/render
    /// context. Idempotent: calling again is a no-op, never an error.
    #[instrument(name = "env_close", skip(self))]
    pub async fn close(&mut self) {
        if self.state == EnvState::Closed {
            return;
        }
        self.bridge.teardown().await;
        self.runtime = None;
        self.scene = None;
        self.state = EnvState::Closed;
        info!(steps = self.steps, episodes = self.episodes, "environment closed");
    }
}
