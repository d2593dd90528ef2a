//! Replay sources — initial state published before the first tick
//!
//! A replay source hands the publisher pre-recorded state (vehicle state,
//! camera metadata, ...) to seed auxiliary channels. The publisher does not
//! interpret the payloads; it wraps each one in an envelope for frame 0.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One seeded channel message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySeed {
    pub channel: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl ReplaySeed {
    pub fn new(channel: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            channel: channel.into(),
            data,
        }
    }
}

/// Provider of initial channel state
pub trait ReplaySource: Send {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Messages to publish once before the first tick
    fn initial_messages(&mut self) -> Result<Vec<ReplaySeed>>;
}

/// Replay source backed by an in-memory list
#[derive(Debug, Clone, Default)]
pub struct StaticReplay {
    name: String,
    seeds: Vec<ReplaySeed>,
}

impl StaticReplay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seeds: Vec::new(),
        }
    }

    pub fn with_seed(mut self, channel: impl Into<String>, data: serde_json::Value) -> Self {
        self.seeds.push(ReplaySeed::new(channel, data));
        self
    }

    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = ReplaySeed>) -> Self {
        self.seeds.extend(seeds);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

impl ReplaySource for StaticReplay {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_messages(&mut self) -> Result<Vec<ReplaySeed>> {
        Ok(self.seeds.clone())
    }
}
