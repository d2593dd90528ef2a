//! Channel bus trait — the transport the publisher writes to
//!
//! All transports (in-process broadcast, NATS, ...) implement `ChannelBus`
//! so the publisher loop never depends on a concrete backend. Delivery is
//! fire-and-forget: a successful publish means the transport accepted the
//! envelope, not that any subscriber received it.

use crate::error::Result;
use crate::messages::Envelope;
use async_trait::async_trait;

pub mod memory;
pub mod nats;

/// Core trait for channel transports
#[async_trait]
pub trait ChannelBus: Send + Sync {
    /// Publish an envelope on its channel, returning a transport sequence number
    async fn publish(&self, envelope: &Envelope) -> Result<u64>;

    /// Subscribe to a set of channels
    async fn subscribe(&self, channels: &[&str]) -> Result<Box<dyn Subscription>>;

    /// Transport status
    async fn info(&self) -> Result<BusInfo>;

    /// Transport name (e.g., "memory", "nats")
    fn name(&self) -> &str;

    /// Flush buffered publishes
    ///
    /// Default implementation is a no-op for transports that write through.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Health check — returns true if the transport is operational
    ///
    /// Default implementation delegates to `info()` and returns true if it succeeds.
    async fn health(&self) -> Result<bool> {
        self.info().await.map(|_| true)
    }
}

/// Async subscription handle
#[async_trait]
pub trait Subscription: Send {
    /// Receive the next envelope; `None` once the bus is closed
    async fn next(&mut self) -> Result<Option<Envelope>>;
}

/// Transport status information
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Transport name
    pub bus: String,
    /// Envelopes accepted since creation
    pub published: u64,
    /// Number of live subscriptions, when the transport knows it
    pub subscribers: usize,
}
