//! Transport bridge - republishes snapshots onto QoS-governed channels.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use contracts::{
    ChannelMessage, ChannelSchema, ChannelSpec, EnvError, MessageHeader, MessagePayload,
    ObservationSnapshot, Pose, SensorName, TransformEdge, TransformTree, Transport, BODY_FRAME,
    WORLD_FRAME,
};

use crate::handle::{ChannelHandle, PublishOutcome};
use crate::state::BridgeState;

/// Bridge configuration derived from the blueprint
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Reliable-channel publish timeout
    pub publish_timeout: Duration,

    /// Transform-tree cadence: the lowest-rate sensor's publish period
    /// (seconds), bounding tf bandwidth
    pub tf_period: f64,
}

/// Per-publish world context supplied by the environment controller
#[derive(Debug, Clone, Copy)]
pub struct PublishContext<'a> {
    /// Current simulation time (seconds)
    pub sim_time: f64,

    /// Whether this step landed on a render tick
    pub render_due: bool,

    /// Completed render ticks since reset
    pub render_tick: u64,

    /// Current body pose for the kinematic world → body edge
    pub body_pose: &'a Pose,
}

/// The transport bridge.
///
/// Owns one worker-backed handle per configured channel plus the lifecycle
/// state machine. If the middleware is unavailable at setup the bridge
/// degrades to a no-op publisher: observations keep flowing to the caller,
/// nothing is discarded from the stepping loop.
pub struct TransportBridge {
    state: BridgeState,
    handles: Vec<ChannelHandle>,
    config: BridgeConfig,
    /// Static body → sensor-mount edges advertised on the tf channel
    static_edges: Vec<TransformEdge>,
    last_tf: Option<f64>,
    degradation_count: u64,
    warned: HashSet<&'static str>,
}

impl TransportBridge {
    /// Construct an uninitialized bridge.
    pub fn new() -> Self {
        Self {
            state: BridgeState::Uninitialized,
            handles: Vec::new(),
            config: BridgeConfig {
                publish_timeout: Duration::from_millis(50),
                tf_period: 0.05,
            },
            static_edges: Vec::new(),
            last_tf: None,
            degradation_count: 0,
            warned: HashSet::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Channels with live workers
    pub fn active_channels(&self) -> usize {
        self.handles.len()
    }

    /// Non-fatal degradations observed so far (unavailable middleware,
    /// publish timeouts, dead workers)
    pub fn degradation_count(&self) -> u64 {
        self.degradation_count
    }

    /// Set up channels against the middleware. May only be called once from
    /// `Uninitialized`.
    ///
    /// # Errors
    /// Sequencing error on repeated setup. Middleware unavailability is NOT
    /// an error: the affected channels are skipped with a single warning and
    /// the bridge enters `Bridging` as a (possibly partial) no-op publisher.
    #[instrument(name = "bridge_setup", skip_all, fields(channels = channels.len()))]
    pub fn setup<T: Transport>(
        &mut self,
        transport: &T,
        channels: &[ChannelSpec],
        mounts: &[(SensorName, Pose)],
        config: BridgeConfig,
    ) -> Result<(), EnvError> {
        if self.state != BridgeState::Uninitialized {
            return Err(EnvError::sequencing("bridge.setup", self.state));
        }

        self.config = config;
        self.static_edges = mounts
            .iter()
            .map(|(name, mount)| TransformEdge {
                parent: BODY_FRAME.to_string(),
                child: name.to_string(),
                transform: *mount,
                is_static: true,
            })
            .collect();

        for spec in channels {
            match transport.create_publisher(spec) {
                Ok(publisher) => {
                    self.handles.push(ChannelHandle::spawn(spec.clone(), publisher));
                }
                Err(e) => {
                    self.degradation_count += 1;
                    warn_once(
                        &mut self.warned,
                        "transport_unavailable",
                        format_args!(
                            "transport '{}' unavailable ({e}); bridging degrades to no-op",
                            transport.name()
                        ),
                    );
                    metrics::counter!("bridge_degraded_total", "class" => "setup").increment(1);
                }
            }
        }

        self.state = BridgeState::Bridging;
        info!(
            transport = transport.name(),
            active = self.handles.len(),
            requested = channels.len(),
            "bridge setup complete"
        );
        Ok(())
    }

    /// Publish one snapshot. Legal only while `Bridging`.
    ///
    /// Maps each sensor sample to its channel, stamps a simulated-time
    /// header, and hands messages to the per-channel workers under their
    /// QoS. Timeouts and congestion drops never fail the step.
    ///
    /// # Errors
    /// Sequencing error outside `Bridging`.
    #[instrument(name = "bridge_publish", level = "debug", skip(self, snapshot, ctx), fields(sim_time = ctx.sim_time))]
    pub async fn publish(
        &mut self,
        snapshot: &ObservationSnapshot,
        ctx: &PublishContext<'_>,
    ) -> Result<(), EnvError> {
        if self.state != BridgeState::Bridging {
            return Err(EnvError::sequencing("bridge.publish", self.state));
        }

        // tf cadence is keyed to the lowest-rate sensor
        let tf_due = ctx.render_due
            && self
                .last_tf
                .is_none_or(|last| ctx.sim_time - last >= self.config.tf_period - 1e-9);
        let mut tf_published = false;

        let timeout = self.config.publish_timeout;
        let mut degradations = 0u64;

        for handle in &mut self.handles {
            let due = match handle.spec().schema {
                ChannelSchema::TransformTree => tf_due,
                _ => handle.is_due(ctx.sim_time, ctx.render_due),
            };
            if !due {
                continue;
            }

            let Some(payload) = build_payload(handle.spec(), snapshot, ctx, &self.static_edges)
            else {
                warn_once(
                    &mut self.warned,
                    "unmapped_channel",
                    format_args!(
                        "channel '{}' has no matching sensor sample; skipping",
                        handle.name()
                    ),
                );
                continue;
            };

            let seq = handle.stamp(ctx.sim_time);
            let message = ChannelMessage {
                header: MessageHeader {
                    sim_time: ctx.sim_time,
                    seq,
                    frame_id: frame_for(handle.spec()),
                },
                payload,
            };

            if handle.spec().schema == ChannelSchema::TransformTree {
                tf_published = true;
            }

            match handle.publish(message, timeout).await {
                PublishOutcome::Sent => {
                    metrics::counter!("bridge_publish_total", "status" => "ok").increment(1);
                }
                PublishOutcome::Dropped => {
                    // best-effort congestion drop; counter only, by contract
                    metrics::counter!("bridge_publish_total", "status" => "dropped").increment(1);
                }
                PublishOutcome::TimedOut => {
                    degradations += 1;
                    metrics::counter!("bridge_publish_total", "status" => "timeout").increment(1);
                    warn_once(
                        &mut self.warned,
                        "publish_timeout",
                        format_args!(
                            "reliable publish on '{}' timed out after {timeout:?}; dropping this step",
                            handle.name()
                        ),
                    );
                }
                PublishOutcome::WorkerClosed => {
                    degradations += 1;
                    warn_once(
                        &mut self.warned,
                        "worker_closed",
                        format_args!("channel '{}' worker is gone", handle.name()),
                    );
                }
            }
        }

        if tf_published {
            self.last_tf = Some(ctx.sim_time);
        }
        self.degradation_count += degradations;
        Ok(())
    }

    /// Await delivery of every in-flight message and rewind the per-channel
    /// rate gates to the new episode's zeroed clock.
    ///
    /// Called by the controller before reseeding sensors so a stale
    /// reliable-channel retransmission cannot bleed into the next episode.
    #[instrument(name = "bridge_drain", skip(self))]
    pub async fn drain(&mut self) {
        if self.state != BridgeState::Bridging {
            return;
        }
        for handle in &mut self.handles {
            handle.flush().await;
            handle.reset_gate();
        }
        self.last_tf = None;
        debug!(channels = self.handles.len(), "bridge drained");
    }

    /// Tear the bridge down. Idempotent; `Bridging` passes through
    /// `ShuttingDown` while in-flight publishes drain.
    #[instrument(name = "bridge_teardown", skip(self))]
    pub async fn teardown(&mut self) {
        match self.state {
            BridgeState::Closed => return,
            BridgeState::Bridging => {
                self.state = BridgeState::ShuttingDown;
                for handle in std::mem::take(&mut self.handles) {
                    handle.shutdown().await;
                }
            }
            BridgeState::Uninitialized | BridgeState::ShuttingDown => {}
        }
        self.state = BridgeState::Closed;
        info!("bridge closed");
    }
}

impl Default for TransportBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the payload for one channel, or None when the snapshot carries no
/// matching sensor.
fn build_payload(
    spec: &ChannelSpec,
    snapshot: &ObservationSnapshot,
    ctx: &PublishContext<'_>,
    static_edges: &[TransformEdge],
) -> Option<MessagePayload> {
    match spec.schema {
        ChannelSchema::Clock => Some(MessagePayload::Clock {
            sim_time: ctx.sim_time,
            render_tick: ctx.render_tick,
        }),
        ChannelSchema::TransformTree => {
            let mut edges = Vec::with_capacity(static_edges.len() + 1);
            edges.push(TransformEdge {
                parent: WORLD_FRAME.to_string(),
                child: BODY_FRAME.to_string(),
                transform: *ctx.body_pose,
                is_static: false,
            });
            edges.extend(static_edges.iter().cloned());
            Some(MessagePayload::Transforms(TransformTree { edges }))
        }
        ChannelSchema::RangeImage | ChannelSchema::Inertial | ChannelSchema::PoseVelocity => {
            let source = spec.source.as_ref()?;
            let sample = snapshot.get(source)?;
            Some(MessagePayload::Sensor(sample.clone()))
        }
    }
}

/// Reference frame a channel's payload is expressed in
fn frame_for(spec: &ChannelSpec) -> String {
    match spec.schema {
        ChannelSchema::Clock | ChannelSchema::TransformTree => WORLD_FRAME.to_string(),
        ChannelSchema::PoseVelocity => WORLD_FRAME.to_string(),
        ChannelSchema::RangeImage | ChannelSchema::Inertial => spec
            .source
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| BODY_FRAME.to_string()),
    }
}

/// Warn once per occurrence class, then stay quiet.
fn warn_once(warned: &mut HashSet<&'static str>, class: &'static str, msg: std::fmt::Arguments<'_>) {
    if warned.insert(class) {
        warn!(class, "{msg}");
    } else {
        debug!(class, "{msg}");
    }
}
