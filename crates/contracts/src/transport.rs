//! Transport traits - Transport Bridge output interface
//!
//! Abstracts the pub/sub middleware behind the bridge. The contract is the
//! QoS axes and degrade-to-no-op behavior, not the process topology: an
//! implementation may be in-process, local IPC, or a network transport.

use crate::{ChannelMessage, ChannelSpec, EnvError};

/// Pub/sub middleware abstraction
///
/// Discovery and connection management are entirely the implementation's
/// responsibility; the bridge only creates publishers.
pub trait Transport: Send + Sync {
    /// Concrete publisher type handed to the bridge's channel workers
    type Publisher: ChannelPublisher + Send + 'static;

    /// Middleware name (used for logging)
    fn name(&self) -> &str;

    /// Create a publisher for one channel
    ///
    /// # Errors
    /// Middleware unavailability; the bridge degrades to a no-op publisher
    /// rather than failing the environment.
    fn create_publisher(&self, spec: &ChannelSpec) -> Result<Self::Publisher, EnvError>;
}

/// Single-channel publisher
///
/// All publisher implementations must implement this trait.
#[trait_variant::make(ChannelPublisher: Send)]
pub trait LocalChannelPublisher {
    /// Channel name (used for logging/metrics)
    fn channel_name(&self) -> &str;

    /// Publish one message
    ///
    /// # Errors
    /// Returns transport error (should include channel context)
    async fn send(&mut self, message: ChannelMessage) -> Result<(), EnvError>;

    /// Close the publisher
    async fn close(&mut self) -> Result<(), EnvError>;
}
