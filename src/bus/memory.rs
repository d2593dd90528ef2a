//! In-memory channel bus
//!
//! Broadcasts envelopes to in-process subscribers over a tokio broadcast
//! channel and keeps a bounded history for inspection. Intended for tests and
//! single-process runs where the UI harness lives in the same binary.

use super::{BusInfo, ChannelBus, Subscription};
use crate::error::Result;
use crate::messages::Envelope;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// In-memory bus configuration
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Broadcast buffer per subscriber; slower subscribers skip ahead
    pub capacity: usize,

    /// Envelopes retained for `history()`; 0 disables history
    pub max_history: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_history: 10_000,
        }
    }
}

/// In-process broadcast bus
pub struct MemoryBus {
    config: MemoryConfig,
    tx: broadcast::Sender<Envelope>,
    history: Arc<RwLock<VecDeque<Envelope>>>,
    sequence: AtomicU64,
}

impl MemoryBus {
    pub fn new(config: MemoryConfig) -> Self {
        let (tx, _) = broadcast::channel(config.capacity.max(1));
        Self {
            config,
            tx,
            history: Arc::new(RwLock::new(VecDeque::new())),
            sequence: AtomicU64::new(0),
        }
    }

    /// Most recent envelopes in publish order, optionally for one channel
    pub async fn history(&self, channel: Option<&str>, limit: usize) -> Vec<Envelope> {
        let history = self.history.read().await;
        let mut recent: Vec<Envelope> = history
            .iter()
            .rev()
            .filter(|env| channel.map_or(true, |c| env.channel == c))
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl ChannelBus for MemoryBus {
    async fn publish(&self, envelope: &Envelope) -> Result<u64> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        if self.config.max_history > 0 {
            let mut history = self.history.write().await;
            history.push_back(envelope.clone());
            while history.len() > self.config.max_history {
                history.pop_front();
            }
        }

        // No live subscribers is not an error for a fire-and-forget bus
        let _ = self.tx.send(envelope.clone());

        tracing::trace!(
            channel = %envelope.channel,
            frame = envelope.frame,
            sequence,
            "Envelope published"
        );

        Ok(sequence)
    }

    async fn subscribe(&self, channels: &[&str]) -> Result<Box<dyn Subscription>> {
        let filter: HashSet<String> = channels.iter().map(|c| c.to_string()).collect();
        tracing::debug!(channels = ?channels, "Memory subscription created");
        Ok(Box::new(MemorySubscription {
            stream: BroadcastStream::new(self.tx.subscribe()),
            channels: filter,
        }))
    }

    async fn info(&self) -> Result<BusInfo> {
        Ok(BusInfo {
            bus: "memory".to_string(),
            published: self.sequence.load(Ordering::SeqCst),
            subscribers: self.tx.receiver_count(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Subscription on a [`MemoryBus`]; an empty channel set receives everything
pub struct MemorySubscription {
    stream: BroadcastStream<Envelope>,
    channels: HashSet<String>,
}

impl MemorySubscription {
    fn accepts(&self, channel: &str) -> bool {
        self.channels.is_empty() || self.channels.contains(channel)
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<Envelope>> {
        while let Some(item) = self.stream.next().await {
            match item {
                Ok(envelope) if self.accepts(&envelope.channel) => return Ok(Some(envelope)),
                Ok(_) => continue,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Memory subscription lagged");
                }
            }
        }
        Ok(None)
    }
}
