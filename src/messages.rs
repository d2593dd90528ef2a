//! Published message shapes
//!
//! Every publish carries an [`Envelope`] naming its channel and the control
//! frame it belongs to. All messages use camelCase JSON for wire
//! compatibility with UI subscribers.

use crate::types::{Alert, AlertSize, AlertStatus, AudibleAlert};
use serde::{Deserialize, Serialize};

/// Channel names published by the simulator
pub mod channels {
    pub const ALERT_STATE: &str = "alertState";
    pub const DEVICE_STATE: &str = "deviceState";
    pub const HARDWARE_STATE: &str = "hardwareState";

    /// Channels published every tick, in publish order
    pub const TICK_CHANNELS: [&str; 3] = [ALERT_STATE, DEVICE_STATE, HARDWARE_STATE];
}

/// Currently presented alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    pub enabled: bool,
    pub alert_text1: String,
    pub alert_text2: String,
    pub alert_size: AlertSize,
    pub alert_status: AlertStatus,
    pub alert_type: String,
    pub alert_sound: AudibleAlert,
}

impl AlertState {
    /// Snapshot of the selected alert, or the "no alert" sentinel
    pub fn from_alert(alert: Option<&Alert>, enabled: bool) -> Self {
        match alert {
            Some(alert) => Self {
                enabled,
                alert_text1: alert.text1.clone(),
                alert_text2: alert.text2.clone(),
                alert_size: alert.size,
                alert_status: alert.status,
                alert_type: alert.alert_type.clone(),
                alert_sound: alert.sound,
            },
            None => Self {
                enabled,
                ..Self::default()
            },
        }
    }

    /// Whether an alert is being presented
    pub fn has_alert(&self) -> bool {
        self.alert_size != AlertSize::None
    }
}

/// Device heartbeat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub started: bool,
}

/// Hardware interface unit family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitType {
    #[default]
    Unknown,
    WhitePanda,
    GreyPanda,
    BlackPanda,
    Pedal,
    Uno,
    Dos,
    RedPanda,
    RedPandaV2,
    Tres,
    Cuatro,
}

/// Status of one hardware interface unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareUnit {
    pub ignition_line: bool,
    pub unit_type: UnitType,
}

/// Message body, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "data")]
pub enum Message {
    AlertState(AlertState),
    DeviceState(DeviceState),
    HardwareState(Vec<HardwareUnit>),
    /// Opaque state seeded from a replay source
    Replay(serde_json::Value),
}

/// A message published on a channel at a given frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub channel: String,

    /// Control frame the message belongs to; shared by every channel
    /// published in the same tick
    pub frame: u64,

    /// Logical monotonic time of the frame in nanoseconds
    pub mono_time_ns: u64,

    pub message: Message,
}

impl Envelope {
    pub fn new(
        channel: impl Into<String>,
        frame: u64,
        mono_time_ns: u64,
        message: Message,
    ) -> Self {
        Self {
            channel: channel.into(),
            frame,
            mono_time_ns,
            message,
        }
    }

    /// Alert state body, if this envelope carries one
    pub fn alert_state(&self) -> Option<&AlertState> {
        match &self.message {
            Message::AlertState(state) => Some(state),
            _ => None,
        }
    }
}
