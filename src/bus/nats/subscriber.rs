//! NATS subscription — merges per-channel subscribers into one stream

use crate::bus::Subscription;
use crate::error::Result;
use crate::messages::Envelope;
use async_trait::async_trait;
use futures::stream::SelectAll;
use futures::StreamExt;

/// Subscription over one or more NATS subjects
pub struct NatsSubscription {
    inner: SelectAll<async_nats::Subscriber>,
}

impl NatsSubscription {
    pub(crate) fn new(subscribers: Vec<async_nats::Subscriber>) -> Self {
        Self {
            inner: futures::stream::select_all(subscribers),
        }
    }
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn next(&mut self) -> Result<Option<Envelope>> {
        match self.inner.next().await {
            Some(message) => {
                let envelope: Envelope = serde_json::from_slice(&message.payload)?;
                Ok(Some(envelope))
            }
            None => Ok(None),
        }
    }
}
