//! # onroad-alerts
//!
//! Alert arbitration and fixed-rate state publishing for exercising
//! driver-assist alert UIs.
//!
//! ## Overview
//!
//! `onroad-alerts` resolves raised events into alerts, decides which single
//! alert is on screen each control frame, and broadcasts that decision
//! together with device and hardware heartbeats on a channel bus. A UI under
//! test subscribes to the bus and renders whatever it receives.
//!
//! ## Quick Start
//!
//! ```rust
//! use onroad_alerts::{AlertContext, AlertManager, EventName, EventRegistry, EventType};
//!
//! let registry = EventRegistry::builtin();
//! let ctx = AlertContext::default();
//! let mut manager = AlertManager::new();
//!
//! let alert = registry
//!     .resolve(EventName::StockAeb, EventType::Permanent, &ctx)
//!     .expect("registered");
//! manager.add_many(0, [alert]);
//!
//! let current = manager.process_alerts(0, &[]).expect("alert on screen");
//! assert_eq!(current.alert_type, "stockAeb/permanent");
//! ```
//!
//! ## Buses
//!
//! - **memory** — In-process broadcast bus with bounded history
//! - **nats** — Core NATS publish/subscribe, one subject per channel
//!
//! ## Architecture
//!
//! - **EventRegistry** — `(event, type)` to alert factory lookup
//! - **AlertManager** — per-frame priority arbitration over sticky alerts
//! - **PublisherLoop** — fixed-rate driver publishing `alertState`,
//!   `deviceState` and `hardwareState`
//! - **ChannelBus** trait — transport abstraction all buses implement

pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod messages;
pub mod process;
pub mod publisher;
pub mod replay;
pub mod schedule;
pub mod types;

// Re-export core types
pub use bus::{BusInfo, ChannelBus, Subscription};
pub use error::{AlertError, Result};
pub use events::{
    alert_identity, AlertContext, AlertFn, EventName, EventRegistry, EventSet, Personality,
    VehicleParams, VehicleState,
};
pub use manager::{ActiveAlert, AlertManager};
pub use messages::{channels, AlertState, DeviceState, Envelope, HardwareUnit, Message, UnitType};
pub use publisher::{PublisherConfig, PublisherLoop, PublisherStats, TickSnapshot};
pub use schedule::{CycleSchedule, EventSchedule, IdleSchedule, ScriptedSchedule};
pub use types::{Alert, AlertSize, AlertStatus, AudibleAlert, EventType, Priority};

// Re-export buses for convenience
pub use bus::memory::{MemoryBus, MemoryConfig};
pub use bus::nats::{NatsBus, NatsClient, NatsConfig, NatsSubscription};
