//! NATS channel bus
//!
//! Implements `ChannelBus` over core NATS publish/subscribe. Each channel maps
//! to one subject under a configurable prefix; envelopes travel as JSON.

mod client;
mod config;
mod subscriber;

pub use client::NatsClient;
pub use config::NatsConfig;
pub use subscriber::NatsSubscription;

use crate::bus::{BusInfo, ChannelBus, Subscription};
use crate::error::Result;
use crate::messages::Envelope;
use async_trait::async_trait;

/// NATS channel bus
pub struct NatsBus {
    client: NatsClient,
}

impl NatsBus {
    /// Connect to NATS
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = NatsClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Get the underlying client for advanced usage
    pub fn client(&self) -> &NatsClient {
        &self.client
    }
}

#[async_trait]
impl ChannelBus for NatsBus {
    async fn publish(&self, envelope: &Envelope) -> Result<u64> {
        self.client.publish(envelope).await
    }

    async fn subscribe(&self, channels: &[&str]) -> Result<Box<dyn Subscription>> {
        let sub = self.client.subscribe(channels).await?;
        Ok(Box::new(sub))
    }

    async fn info(&self) -> Result<BusInfo> {
        Ok(BusInfo {
            bus: "nats".to_string(),
            published: self.client.published(),
            subscribers: 0,
        })
    }

    fn name(&self) -> &str {
        "nats"
    }

    async fn flush(&self) -> Result<()> {
        self.client.flush().await
    }

    async fn health(&self) -> Result<bool> {
        Ok(self.client.is_connected())
    }
}
