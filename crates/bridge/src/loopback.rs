//! In-process loopback transport.
//!
//! Realizes the transport contract without any process or network boundary:
//! named channels, both QoS axes, and wall-clock-free timestamps. Transient
//! durability retains the last `depth` wire messages and replays them to
//! late subscribers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::debug;

use contracts::{
    ChannelMessage, ChannelPublisher, ChannelSpec, Durability, EnvError, QosPolicy, Transport,
};

use crate::codec::{decode_message, encode_message};

/// Broadcast fan-out capacity per channel
const FANOUT_CAPACITY: usize = 64;

#[derive(Debug)]
struct ChannelEntry {
    tx: broadcast::Sender<Bytes>,
    retained: VecDeque<Bytes>,
    qos: QosPolicy,
}

/// In-process pub/sub middleware.
#[derive(Debug, Default, Clone)]
pub struct LoopbackTransport {
    channels: Arc<Mutex<HashMap<String, ChannelEntry>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel by name.
    ///
    /// Transient channels replay their retained window first. Returns None
    /// for channels no publisher has created yet.
    pub fn subscribe(&self, channel: &str) -> Option<LoopbackSubscriber> {
        let channels = self.channels.lock().unwrap();
        let entry = channels.get(channel)?;
        Some(LoopbackSubscriber {
            channel: channel.to_string(),
            backlog: entry.retained.iter().cloned().collect(),
            rx: entry.tx.subscribe(),
        })
    }

    /// Number of channels publishers have created (diagnostics)
    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }
}

impl Transport for LoopbackTransport {
    type Publisher = LoopbackPublisher;

    fn name(&self) -> &str {
        "loopback"
    }

    fn create_publisher(&self, spec: &ChannelSpec) -> Result<LoopbackPublisher, EnvError> {
        let mut channels = self.channels.lock().unwrap();
        channels.entry(spec.name.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(FANOUT_CAPACITY);
            ChannelEntry {
                tx,
                retained: VecDeque::new(),
                qos: spec.qos,
            }
        });
        debug!(channel = %spec.name, "loopback publisher created");
        Ok(LoopbackPublisher {
            channel: spec.name.clone(),
            channels: Arc::clone(&self.channels),
        })
    }
}

/// Publisher side of one loopback channel
pub struct LoopbackPublisher {
    channel: String,
    channels: Arc<Mutex<HashMap<String, ChannelEntry>>>,
}

impl ChannelPublisher for LoopbackPublisher {
    fn channel_name(&self) -> &str {
        &self.channel
    }

    async fn send(&mut self, message: ChannelMessage) -> Result<(), EnvError> {
        let wire = encode_message(&self.channel, &message)?;

        let mut channels = self.channels.lock().unwrap();
        let entry = channels
            .get_mut(&self.channel)
            .ok_or_else(|| EnvError::transport(&self.channel, "channel torn down"))?;

        if entry.qos.durability == Durability::Transient {
            if entry.retained.len() == entry.qos.depth.max(1) {
                entry.retained.pop_front();
            }
            entry.retained.push_back(wire.clone());
        }

        // no subscribers is not an error on a pub/sub bus
        let _ = entry.tx.send(wire);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}

/// Subscriber side of one loopback channel
pub struct LoopbackSubscriber {
    channel: String,
    backlog: VecDeque<Bytes>,
    rx: broadcast::Receiver<Bytes>,
}

impl LoopbackSubscriber {
    /// Receive the next message, replaying any retained backlog first.
    /// Returns None once the channel is gone.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        if let Some(wire) = self.backlog.pop_front() {
            return decode_message(&self.channel, &wire).ok();
        }
        loop {
            match self.rx.recv().await {
                Ok(wire) => return decode_message(&self.channel, &wire).ok(),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(channel = %self.channel, skipped, "subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive for tests and polling consumers.
    pub fn try_recv(&mut self) -> Option<ChannelMessage> {
        if let Some(wire) = self.backlog.pop_front() {
            return decode_message(&self.channel, &wire).ok();
        }
        loop {
            match self.rx.try_recv() {
                Ok(wire) => return decode_message(&self.channel, &wire).ok(),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// A transport whose middleware is unreachable.
///
/// Every publisher creation fails, driving the bridge into its degraded
/// no-op mode; useful for offline testing.
#[derive(Debug, Default, Clone)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    type Publisher = LoopbackPublisher;

    fn name(&self) -> &str {
        "offline"
    }

    fn create_publisher(&self, spec: &ChannelSpec) -> Result<LoopbackPublisher, EnvError> {
        Err(EnvError::transport(&spec.name, "middleware unavailable"))
    }
}
