//! Simulator configuration (TOML)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::memory::{MemoryBus, MemoryConfig};
use crate::bus::nats::{NatsBus, NatsConfig};
use crate::bus::ChannelBus;
use crate::error::{AlertError, Result};
use crate::events::{AlertContext, EventName, EventRegistry, Personality};
use crate::messages::{HardwareUnit, UnitType};
use crate::process::ProcessConfig;
use crate::publisher::PublisherConfig;
use crate::replay::{ReplaySeed, StaticReplay};
use crate::schedule::{CycleSchedule, EventSchedule};
use crate::types::EventType;

/// User-configurable settings for a simulator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Control tick period in milliseconds (default: 10)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Frames each scenario alert stays raised (default: 200)
    #[serde(default = "default_hold_frames")]
    pub hold_frames: u64,

    /// Start the scenario over after the last alert (default: true)
    #[serde(default = "default_repeat")]
    pub repeat: bool,

    /// Stop after this many ticks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Render speeds in km/h (default: true)
    #[serde(default = "default_is_metric")]
    pub is_metric: bool,

    #[serde(default)]
    pub personality: Personality,

    /// `enabled` flag reported with every alert
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub scenario: Scenario,

    #[serde(default)]
    pub bus: BusConfig,

    /// UI process started around the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<ProcessConfig>,

    /// Messages published once before the first tick
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replay: Vec<ReplaySeed>,

    /// Units reported on `hardwareState`
    #[serde(default = "default_hardware")]
    pub hardware: Vec<HardwareUnit>,
}

fn default_tick_ms() -> u64 {
    10
}

fn default_hold_frames() -> u64 {
    200
}

fn default_repeat() -> bool {
    true
}

fn default_is_metric() -> bool {
    true
}

fn default_hardware() -> Vec<HardwareUnit> {
    vec![HardwareUnit {
        ignition_line: true,
        unit_type: UnitType::Dos,
    }]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            hold_frames: default_hold_frames(),
            repeat: default_repeat(),
            max_ticks: None,
            is_metric: default_is_metric(),
            personality: Personality::default(),
            enabled: false,
            scenario: Scenario::default(),
            bus: BusConfig::default(),
            ui: None,
            replay: Vec::new(),
            hardware: default_hardware(),
        }
    }
}

/// Which alerts the run cycles through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Scenario {
    /// A fixed list of `(event, type)` pairs
    Specific { alerts: Vec<ScenarioAlert> },
    /// Every pair in the registry
    All,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario::Specific {
            alerts: vec![
                ScenarioAlert::new(EventName::StartupNoControl, EventType::NoEntry),
                ScenarioAlert::new(EventName::CalibrationInvalid, EventType::Permanent),
                ScenarioAlert::new(EventName::StockAeb, EventType::Permanent),
                ScenarioAlert::new(EventName::Fcw, EventType::Permanent),
            ],
        }
    }
}

/// One scenario step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioAlert {
    pub event: EventName,
    #[serde(rename = "type")]
    pub event_type: EventType,
}

impl ScenarioAlert {
    pub fn new(event: EventName, event_type: EventType) -> Self {
        Self { event, event_type }
    }
}

/// Transport selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BusConfig {
    Memory {
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
    Nats(NatsConfig),
}

fn default_capacity() -> usize {
    MemoryConfig::default().capacity
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::Memory {
            capacity: default_capacity(),
        }
    }
}

impl SimConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlertError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AlertError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            AlertError::Config(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(AlertError::Config("tick_ms must be positive".to_string()));
        }
        if self.hold_frames == 0 {
            return Err(AlertError::Config(
                "hold_frames must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            tick: self.tick(),
            max_ticks: self.max_ticks,
            enabled: self.enabled,
            started: true,
            hardware: self.hardware.clone(),
        }
    }

    pub fn alert_context(&self) -> AlertContext {
        AlertContext {
            is_metric: self.is_metric,
            personality: self.personality,
            ..AlertContext::default()
        }
    }

    /// Schedule cycling the scenario's alerts
    pub fn schedule(&self, registry: &EventRegistry) -> Box<dyn EventSchedule> {
        let schedule = match &self.scenario {
            Scenario::All => CycleSchedule::all(registry, self.hold_frames),
            Scenario::Specific { alerts } => CycleSchedule::new(
                alerts.iter().map(|a| (a.event, a.event_type)).collect(),
                self.hold_frames,
            ),
        };
        Box::new(schedule.repeating(self.repeat))
    }

    pub fn replay(&self) -> Option<StaticReplay> {
        if self.replay.is_empty() {
            return None;
        }
        Some(StaticReplay::new("config").with_seeds(self.replay.iter().cloned()))
    }

    /// Connect the configured transport
    pub async fn connect_bus(&self) -> Result<Arc<dyn ChannelBus>> {
        match &self.bus {
            BusConfig::Memory { capacity } => Ok(Arc::new(MemoryBus::new(MemoryConfig {
                capacity: *capacity,
                ..MemoryConfig::default()
            }))),
            BusConfig::Nats(nats) => Ok(Arc::new(NatsBus::connect(nats.clone()).await?)),
        }
    }
}
