//! ChannelHandle - manages one channel with isolated queue and worker task.
//!
//! QoS realization: the bounded queue is the channel's history window.
//! Best-effort channels drop on a full queue without surfacing an error;
//! reliable channels wait for queue space up to the publish timeout, then
//! report the timeout so the stepping loop can count it and move on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::{ChannelMessage, ChannelPublisher, ChannelSpec, Reliability};

/// Worker command
enum Command {
    Publish(ChannelMessage),
    Flush(oneshot::Sender<()>),
}

/// Result of a single publish attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Queued for delivery
    Sent,
    /// Best-effort drop under congestion
    Dropped,
    /// Reliable channel timed out waiting for queue space
    TimedOut,
    /// Worker is gone; channel unusable
    WorkerClosed,
}

/// Per-channel delivery counters
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    pub sent: AtomicU64,
    pub dropped: AtomicU64,
    pub timeouts: AtomicU64,
    pub write_failures: AtomicU64,
}

/// Handle to one running channel worker
pub struct ChannelHandle {
    spec: ChannelSpec,
    tx: mpsc::Sender<Command>,
    metrics: Arc<ChannelMetrics>,
    worker: JoinHandle<()>,
    /// Sim time of the last accepted publish (rate gating)
    last_publish: Option<f64>,
    /// Per-channel sequence number
    seq: u64,
}

impl ChannelHandle {
    /// Spawn the worker task for one channel.
    ///
    /// Queue capacity is the QoS history depth.
    pub fn spawn<P: ChannelPublisher + Send + 'static>(spec: ChannelSpec, publisher: P) -> Self {
        let capacity = spec.qos.depth.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let metrics = Arc::new(ChannelMetrics::default());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = spec.name.clone();
        let worker = tokio::spawn(async move {
            channel_worker(publisher, rx, worker_metrics, worker_name).await;
        });

        Self {
            spec,
            tx,
            metrics,
            worker,
            last_publish: None,
            seq: 0,
        }
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Channel spec
    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Delivery counters
    pub fn metrics(&self) -> &ChannelMetrics {
        &self.metrics
    }

    /// Whether this channel is due at `sim_time` given its target rate.
    ///
    /// Channels without a target rate publish at the render-tick cadence,
    /// which the caller signals with `render_due`.
    pub fn is_due(&self, sim_time: f64, render_due: bool) -> bool {
        match self.spec.target_rate_hz {
            Some(rate) => self
                .last_publish
                .is_none_or(|last| sim_time - last >= 1.0 / rate - 1e-9),
            None => render_due,
        }
    }

    /// Next sequence number, recording the publish time.
    pub fn stamp(&mut self, sim_time: f64) -> u64 {
        self.last_publish = Some(sim_time);
        self.seq += 1;
        self.seq
    }

    /// Forget the last publish time. The simulation clock rewinds to zero
    /// on episode reset, which would otherwise leave the rate gate stuck
    /// in the future. Sequence numbers keep increasing across episodes.
    pub fn reset_gate(&mut self) {
        self.last_publish = None;
    }

    /// Hand a message to the worker according to the channel's reliability.
    pub async fn publish(&self, message: ChannelMessage, timeout: Duration) -> PublishOutcome {
        match self.spec.qos.reliability {
            Reliability::BestEffort => match self.tx.try_send(Command::Publish(message)) {
                Ok(()) => {
                    self.metrics.sent.fetch_add(1, Ordering::Relaxed);
                    PublishOutcome::Sent
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!(channel = %self.spec.name, "best-effort drop under congestion");
                    PublishOutcome::Dropped
                }
                Err(mpsc::error::TrySendError::Closed(_)) => PublishOutcome::WorkerClosed,
            },
            Reliability::Reliable => {
                match tokio::time::timeout(timeout, self.tx.send(Command::Publish(message))).await {
                    Ok(Ok(())) => {
                        self.metrics.sent.fetch_add(1, Ordering::Relaxed);
                        PublishOutcome::Sent
                    }
                    Ok(Err(_)) => PublishOutcome::WorkerClosed,
                    Err(_) => {
                        self.metrics.timeouts.fetch_add(1, Ordering::Relaxed);
                        PublishOutcome::TimedOut
                    }
                }
            }
        }
    }

    /// Wait until every queued message has been handed to the transport.
    #[instrument(name = "channel_flush", skip(self), fields(channel = %self.spec.name))]
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Shutdown the worker gracefully, draining first.
    #[instrument(name = "channel_shutdown", skip(self), fields(channel = %self.spec.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(channel = %self.spec.name, error = ?e, "channel worker panicked");
        }
        debug!(channel = %self.spec.name, "channel shutdown complete");
    }
}

/// Worker task: drains commands and writes to the transport publisher.
async fn channel_worker<P: ChannelPublisher>(
    mut publisher: P,
    mut rx: mpsc::Receiver<Command>,
    metrics: Arc<ChannelMetrics>,
    name: String,
) {
    debug!(channel = %name, "channel worker started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::Publish(message) => {
                if let Err(e) = publisher.send(message).await {
                    metrics.write_failures.fetch_add(1, Ordering::Relaxed);
                    error!(channel = %name, error = %e, "transport write failed");
                    // keep draining; a single failure never stops the channel
                }
            }
            Command::Flush(ack) => {
                // queue order guarantees everything before the marker is out
                let _ = ack.send(());
            }
        }
    }

    if let Err(e) = publisher.close().await {
        error!(channel = %name, error = %e, "publisher close failed");
    }
    debug!(channel = %name, "channel worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChannelSchema, Durability, EnvError, MessageHeader, MessagePayload, QosPolicy};
    use std::sync::Mutex;

    struct RecordingPublisher {
        name: String,
        log: Arc<Mutex<Vec<u64>>>,
        delay: Duration,
    }

    impl ChannelPublisher for RecordingPublisher {
        fn channel_name(&self) -> &str {
            &self.name
        }

        async fn send(&mut self, message: ChannelMessage) -> Result<(), EnvError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.log.lock().unwrap().push(message.header.seq);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), EnvError> {
            Ok(())
        }
    }

    fn spec(reliability: Reliability, depth: usize) -> ChannelSpec {
        ChannelSpec {
            name: "/clock".into(),
            schema: ChannelSchema::Clock,
            source: None,
            qos: QosPolicy {
                reliability,
                durability: Durability::Volatile,
                depth,
            },
            target_rate_hz: None,
        }
    }

    fn message(seq: u64) -> ChannelMessage {
        ChannelMessage {
            header: MessageHeader {
                sim_time: seq as f64 * 0.05,
                seq,
                frame_id: "world".into(),
            },
            payload: MessagePayload::Clock {
                sim_time: seq as f64 * 0.05,
                render_tick: seq,
            },
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_flushes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let publisher = RecordingPublisher {
            name: "/clock".into(),
            log: Arc::clone(&log),
            delay: Duration::ZERO,
        };
        let handle = ChannelHandle::spawn(spec(Reliability::Reliable, 8), publisher);

        for seq in 1..=5 {
            let outcome = handle
                .publish(message(seq), Duration::from_millis(100))
                .await;
            assert_eq!(outcome, PublishOutcome::Sent);
        }
        handle.flush().await;
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4, 5]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn best_effort_drops_when_congested() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let publisher = RecordingPublisher {
            name: "/clock".into(),
            log: Arc::clone(&log),
            delay: Duration::from_millis(50),
        };
        let handle = ChannelHandle::spawn(spec(Reliability::BestEffort, 1), publisher);

        let mut dropped = 0;
        for seq in 1..=10 {
            if handle.publish(message(seq), Duration::ZERO).await == PublishOutcome::Dropped {
                dropped += 1;
            }
        }
        assert!(dropped > 0);
        assert_eq!(
            handle.metrics().dropped.load(Ordering::Relaxed),
            dropped as u64
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn reliable_times_out_instead_of_stalling() {
        let publisher = RecordingPublisher {
            name: "/clock".into(),
            log: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::from_secs(5),
        };
        let handle = ChannelHandle::spawn(spec(Reliability::Reliable, 1), publisher);

        // first fills the queue, second parks in the worker, third must time out
        assert_eq!(
            handle.publish(message(1), Duration::from_millis(10)).await,
            PublishOutcome::Sent
        );
        handle.publish(message(2), Duration::from_millis(10)).await;
        let outcome = handle.publish(message(3), Duration::from_millis(10)).await;
        assert_eq!(outcome, PublishOutcome::TimedOut);

        handle.worker.abort();
    }

    #[tokio::test]
    async fn rate_gating_uses_sim_time() {
        let publisher = RecordingPublisher {
            name: "/clock".into(),
            log: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        };
        let mut channel_spec = spec(Reliability::Reliable, 8);
        channel_spec.target_rate_hz = Some(10.0);
        let mut handle = ChannelHandle::spawn(channel_spec, publisher);

        assert!(handle.is_due(0.0, false));
        handle.stamp(0.0);
        assert!(!handle.is_due(0.05, false));
        assert!(handle.is_due(0.1, false));

        handle.shutdown().await;
    }
}
