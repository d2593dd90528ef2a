//! Event registry — named conditions and the alerts they resolve to
//!
//! Every registry entry is a uniform factory `Fn(&AlertContext) -> Option<Alert>`.
//! Static alerts are registered as constant-returning factories, so callers
//! never distinguish between fixed and context-dependent alerts.

mod catalog;

use crate::error::{AlertError, Result};
use crate::types::{Alert, EventType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Alert-producing factory
pub type AlertFn = Arc<dyn Fn(&AlertContext) -> Option<Alert> + Send + Sync>;

/// Named conditions known to the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    Startup,
    StartupNoControl,
    StartupNoCar,
    CalibrationInvalid,
    CalibrationIncomplete,
    StockAeb,
    StockFcw,
    Fcw,
    PersonalityChanged,
    BelowSteerSpeed,
    BelowEngageSpeed,
    SpeedTooHigh,
    DoorOpen,
    SeatbeltNotLatched,
    WrongGear,
    Overheat,
    LowMemory,
    PreDriverDistracted,
    DriverDistracted,
    SteerSaturated,
    LaneChangeBlocked,
    SteerTempUnavailable,
    ControlsMismatch,
    CanError,
    NoGps,
}

impl EventName {
    pub fn all() -> &'static [EventName] {
        &[
            EventName::Startup,
            EventName::StartupNoControl,
            EventName::StartupNoCar,
            EventName::CalibrationInvalid,
            EventName::CalibrationIncomplete,
            EventName::StockAeb,
            EventName::StockFcw,
            EventName::Fcw,
            EventName::PersonalityChanged,
            EventName::BelowSteerSpeed,
            EventName::BelowEngageSpeed,
            EventName::SpeedTooHigh,
            EventName::DoorOpen,
            EventName::SeatbeltNotLatched,
            EventName::WrongGear,
            EventName::Overheat,
            EventName::LowMemory,
            EventName::PreDriverDistracted,
            EventName::DriverDistracted,
            EventName::SteerSaturated,
            EventName::LaneChangeBlocked,
            EventName::SteerTempUnavailable,
            EventName::ControlsMismatch,
            EventName::CanError,
            EventName::NoGps,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Startup => "startup",
            EventName::StartupNoControl => "startupNoControl",
            EventName::StartupNoCar => "startupNoCar",
            EventName::CalibrationInvalid => "calibrationInvalid",
            EventName::CalibrationIncomplete => "calibrationIncomplete",
            EventName::StockAeb => "stockAeb",
            EventName::StockFcw => "stockFcw",
            EventName::Fcw => "fcw",
            EventName::PersonalityChanged => "personalityChanged",
            EventName::BelowSteerSpeed => "belowSteerSpeed",
            EventName::BelowEngageSpeed => "belowEngageSpeed",
            EventName::SpeedTooHigh => "speedTooHigh",
            EventName::DoorOpen => "doorOpen",
            EventName::SeatbeltNotLatched => "seatbeltNotLatched",
            EventName::WrongGear => "wrongGear",
            EventName::Overheat => "overheat",
            EventName::LowMemory => "lowMemory",
            EventName::PreDriverDistracted => "preDriverDistracted",
            EventName::DriverDistracted => "driverDistracted",
            EventName::SteerSaturated => "steerSaturated",
            EventName::LaneChangeBlocked => "laneChangeBlocked",
            EventName::SteerTempUnavailable => "steerTempUnavailable",
            EventName::ControlsMismatch => "controlsMismatch",
            EventName::CanError => "canError",
            EventName::NoGps => "noGps",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        EventName::all()
            .iter()
            .copied()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AlertError::UnknownEvent(s.to_string()))
    }
}

/// Longitudinal driving personality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Personality {
    Aggressive,
    #[default]
    Standard,
    Relaxed,
}

impl Personality {
    pub fn all() -> &'static [Personality] {
        &[
            Personality::Aggressive,
            Personality::Standard,
            Personality::Relaxed,
        ]
    }

    /// Display label used in alert text
    pub fn label(self) -> &'static str {
        match self {
            Personality::Aggressive => "Aggressive",
            Personality::Standard => "Standard",
            Personality::Relaxed => "Relaxed",
        }
    }
}

/// Static vehicle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleParams {
    pub brand: String,

    /// Lowest speed lateral control is available at (m/s)
    pub min_steer_speed: f64,

    /// Lowest speed engagement is allowed at (m/s)
    pub min_enable_speed: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            brand: "mock".to_string(),
            min_steer_speed: 0.0,
            min_enable_speed: 0.0,
        }
    }
}

/// Live vehicle measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    /// Ego speed (m/s)
    pub v_ego: f64,

    /// Cruise set speed (m/s)
    pub v_cruise: f64,
}

/// Everything alert text or priority may depend on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertContext {
    pub vehicle: VehicleParams,
    pub state: VehicleState,
    pub is_metric: bool,

    /// Current control frame
    pub frame: u64,

    pub personality: Personality,

    /// Calibration progress, 0-100
    pub calibration_percent: u8,
}

impl Default for AlertContext {
    fn default() -> Self {
        Self {
            vehicle: VehicleParams::default(),
            state: VehicleState::default(),
            is_metric: true,
            frame: 0,
            personality: Personality::Standard,
            calibration_percent: 0,
        }
    }
}

const MS_TO_KPH: f64 = 3.6;
const MS_TO_MPH: f64 = 2.236_936;

impl AlertContext {
    /// Render a speed in m/s for display in the configured unit system
    pub fn display_speed(&self, speed_ms: f64) -> String {
        let (factor, unit) = if self.is_metric {
            (MS_TO_KPH, "km/h")
        } else {
            (MS_TO_MPH, "mph")
        };
        format!("{} {}", (speed_ms * factor).round() as i64, unit)
    }
}

/// Mapping from `(event, event type)` to alert factories
#[derive(Clone, Default)]
pub struct EventRegistry {
    entries: BTreeMap<EventName, BTreeMap<EventType, AlertFn>>,
}

impl EventRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in onroad alert catalogue
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        catalog::register_all(&mut registry);
        registry
    }

    /// Register a context-dependent factory, replacing any previous entry
    pub fn register<F>(&mut self, name: EventName, event_type: EventType, factory: F) -> &mut Self
    where
        F: Fn(&AlertContext) -> Option<Alert> + Send + Sync + 'static,
    {
        self.entries
            .entry(name)
            .or_default()
            .insert(event_type, Arc::new(factory));
        self
    }

    /// Register a fixed alert
    pub fn register_static(
        &mut self,
        name: EventName,
        event_type: EventType,
        alert: Alert,
    ) -> &mut Self {
        self.register(name, event_type, move |_| Some(alert.clone()))
    }

    /// Resolve an event under one event type
    ///
    /// Returns `None` when the event has no alert for that type. The returned
    /// alert is stamped with the identity `<event>/<type>`.
    pub fn resolve(
        &self,
        name: EventName,
        event_type: EventType,
        ctx: &AlertContext,
    ) -> Option<Alert> {
        let factory = self.entries.get(&name)?.get(&event_type)?;
        factory(ctx).map(|alert| alert.with_type(alert_identity(name, event_type)))
    }

    /// Resolve by wire names; unknown names resolve to `None`
    pub fn resolve_named(&self, name: &str, event_type: &str, ctx: &AlertContext) -> Option<Alert> {
        let name = name.parse::<EventName>().ok()?;
        let event_type = event_type.parse::<EventType>().ok()?;
        self.resolve(name, event_type, ctx)
    }

    /// Resolve an explicit subset of pairs, skipping those with no alert
    pub fn resolve_many(
        &self,
        pairs: &[(EventName, EventType)],
        ctx: &AlertContext,
    ) -> Vec<Alert> {
        pairs
            .iter()
            .filter_map(|&(name, et)| self.resolve(name, et, ctx))
            .collect()
    }

    /// Whether a factory is registered for the pair
    pub fn contains(&self, name: EventName, event_type: EventType) -> bool {
        self.entries
            .get(&name)
            .is_some_and(|types| types.contains_key(&event_type))
    }

    /// Event types registered for an event
    pub fn types_for(&self, name: EventName) -> Vec<EventType> {
        self.entries
            .get(&name)
            .map(|types| types.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every registered pair, ordered by event then type
    pub fn iter(&self) -> impl Iterator<Item = (EventName, EventType)> + '_ {
        self.entries
            .iter()
            .flat_map(|(name, types)| types.keys().map(move |et| (*name, *et)))
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("pairs", &self.len())
            .finish()
    }
}

/// Identity of a catalogue alert
pub fn alert_identity(name: EventName, event_type: EventType) -> String {
    format!("{}/{}", name, event_type)
}

/// Events raised in the current frame
///
/// Insertion-ordered and duplicate-free. The driver clears and rebuilds it
/// every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSet {
    names: Vec<EventName>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Raise an event; raising it twice in one frame is a no-op
    pub fn add(&mut self, name: EventName) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    pub fn contains(&self, name: EventName) -> bool {
        self.names.contains(&name)
    }

    pub fn names(&self) -> &[EventName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve every raised event under every requested type
    ///
    /// Order follows event insertion, then `types` order. Pairs without an
    /// alert are skipped.
    pub fn create_alerts(
        &self,
        registry: &EventRegistry,
        types: &[EventType],
        ctx: &AlertContext,
    ) -> Vec<Alert> {
        self.names
            .iter()
            .flat_map(|&name| types.iter().map(move |&et| (name, et)))
            .filter_map(|(name, et)| registry.resolve(name, et, ctx))
            .collect()
    }
}

impl FromIterator<EventName> for EventSet {
    fn from_iter<I: IntoIterator<Item = EventName>>(iter: I) -> Self {
        let mut set = EventSet::new();
        for name in iter {
            set.add(name);
        }
        set
    }
}
