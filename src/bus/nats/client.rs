//! NATS client — connect, publish, subscribe

use super::config::NatsConfig;
use super::subscriber::NatsSubscription;
use crate::error::{AlertError, Result};
use crate::messages::Envelope;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// NATS core client
///
/// Publishes are at-most-once; nothing is persisted server-side.
pub struct NatsClient {
    client: async_nats::Client,
    config: Arc<NatsConfig>,
    published: AtomicU64,
}

impl NatsClient {
    /// Connect to the NATS server
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = build_connect_options(&config)
            .connect(&config.url)
            .await
            .map_err(|e| AlertError::Connection(format!("{}: {}", config.url, e)))?;

        tracing::info!(url = %config.url, prefix = %config.subject_prefix, "Connected to NATS");

        Ok(Self {
            client,
            config: Arc::new(config),
            published: AtomicU64::new(0),
        })
    }

    /// Publish an envelope on `<prefix>.<channel>`
    pub async fn publish(&self, envelope: &Envelope) -> Result<u64> {
        let subject = self.config.subject(&envelope.channel);
        let payload = serde_json::to_vec(envelope)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| AlertError::Publish {
                channel: envelope.channel.clone(),
                reason: e.to_string(),
            })?;

        let sequence = self.published.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::trace!(
            subject = %subject,
            frame = envelope.frame,
            sequence,
            "Envelope published"
        );

        Ok(sequence)
    }

    /// Subscribe to a set of channels; an empty set subscribes to all of them
    pub async fn subscribe(&self, channels: &[&str]) -> Result<NatsSubscription> {
        let subjects: Vec<String> = if channels.is_empty() {
            vec![self.config.subject(">")]
        } else {
            channels.iter().map(|c| self.config.subject(c)).collect()
        };

        let mut subscribers = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let subscriber = self
                .client
                .subscribe(subject.clone())
                .await
                .map_err(|e| AlertError::Subscribe {
                    channel: subject.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(subject = %subject, "NATS subscription created");
            subscribers.push(subscriber);
        }

        Ok(NatsSubscription::new(subscribers))
    }

    /// Flush pending publishes to the server
    pub async fn flush(&self) -> Result<()> {
        self.client
            .flush()
            .await
            .map_err(|e| AlertError::Connection(format!("flush failed: {}", e)))
    }

    /// Envelopes accepted since connect
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Whether the connection is currently up
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Get the underlying NATS client
    pub fn nats_client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Get the configuration
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}

/// Build NATS connect options from config
fn build_connect_options(config: &NatsConfig) -> async_nats::ConnectOptions {
    let mut opts = async_nats::ConnectOptions::new()
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .request_timeout(Some(Duration::from_secs(config.request_timeout_secs)));

    if let Some(ref token) = config.token {
        opts = opts.token(token.clone());
    }

    if let Some(ref name) = config.client_name {
        opts = opts.name(name);
    }

    opts
}
