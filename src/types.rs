//! Core alert types
//!
//! All wire-facing enums use camelCase JSON serialization so UI subscribers
//! see the same spellings the alert catalogue uses (`userPrompt`,
//! `warningSoft`, `noEntry`, ...).

use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Control loop period in seconds (100 Hz)
pub const DT_CTRL: f64 = 0.01;

/// Convert a presentation time in seconds to whole control frames
pub fn secs_to_frames(secs: f64) -> i64 {
    (secs / DT_CTRL).round() as i64
}

/// Arbitration priority; higher wins
///
/// Named tiers cover the catalogue. Arbitrary values are allowed so tests and
/// one-off alerts can slot between tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOWEST: Priority = Priority(0);
    pub const LOWER: Priority = Priority(1);
    pub const LOW: Priority = Priority(2);
    pub const MID: Priority = Priority(3);
    pub const HIGH: Priority = Priority(4);
    pub const HIGHEST: Priority = Priority(5);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOWEST
    }
}

/// Why an alert exists
///
/// Each classification carries a default priority tier; individual alerts may
/// override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    /// Blocks engagement
    NoEntry,
    /// Transient caution
    Warning,
    /// Engagement will end shortly unless the condition clears
    SoftDisable,
    /// Persistent fault shown for as long as it is raised
    Permanent,
    /// Engagement ends now
    ImmediateDisable,
}

impl EventType {
    /// Every event type, lowest tier first
    pub fn all() -> &'static [EventType] {
        &[
            EventType::NoEntry,
            EventType::Warning,
            EventType::SoftDisable,
            EventType::Permanent,
            EventType::ImmediateDisable,
        ]
    }

    /// Default arbitration tier for alerts of this type
    pub fn default_priority(self) -> Priority {
        match self {
            EventType::NoEntry => Priority::LOW,
            EventType::Warning => Priority::MID,
            EventType::SoftDisable | EventType::Permanent => Priority::HIGH,
            EventType::ImmediateDisable => Priority::HIGHEST,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::NoEntry => "noEntry",
            EventType::Warning => "warning",
            EventType::SoftDisable => "softDisable",
            EventType::Permanent => "permanent",
            EventType::ImmediateDisable => "immediateDisable",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        EventType::all()
            .iter()
            .copied()
            .find(|et| et.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AlertError::UnknownEvent(format!("event type '{}'", s)))
    }
}

/// Visual footprint of an alert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSize {
    /// No alert shown
    #[default]
    None,
    Small,
    Mid,
    Full,
}

/// Visual urgency of an alert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

/// Audio cue played with an alert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudibleAlert {
    #[default]
    None,
    Engage,
    Disengage,
    Refuse,
    Prompt,
    PromptRepeat,
    PromptDistracted,
    WarningSoft,
    WarningImmediate,
}

/// A single presentable condition
///
/// Alerts are built fresh every frame by the event registry and never mutated
/// afterwards; the builder methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub text1: String,
    pub text2: String,
    pub size: AlertSize,
    pub status: AlertStatus,

    /// Alert identity, `<eventName>/<eventType>` for catalogue alerts
    pub alert_type: String,

    pub sound: AudibleAlert,

    /// Presentation window in frames. 0 shows the alert for a single frame;
    /// negative values are treated as 0.
    pub duration: i64,

    pub priority: Priority,
}

impl Alert {
    /// Create an alert with an explicit priority and a duration in seconds
    pub fn new(
        text1: impl Into<String>,
        text2: impl Into<String>,
        status: AlertStatus,
        size: AlertSize,
        priority: Priority,
        sound: AudibleAlert,
        duration_secs: f64,
    ) -> Self {
        Self {
            text1: text1.into(),
            text2: text2.into(),
            size,
            status,
            alert_type: String::new(),
            sound,
            duration: secs_to_frames(duration_secs),
            priority,
        }
    }

    /// Create an alert whose priority is the default tier of `event_type`
    pub fn tiered(
        event_type: EventType,
        text1: impl Into<String>,
        text2: impl Into<String>,
        status: AlertStatus,
        size: AlertSize,
        sound: AudibleAlert,
        duration_secs: f64,
    ) -> Self {
        Self::new(
            text1,
            text2,
            status,
            size,
            event_type.default_priority(),
            sound,
            duration_secs,
        )
    }

    /// Standard "cannot engage" alert
    pub fn no_entry(text2: impl Into<String>) -> Self {
        Self::tiered(
            EventType::NoEntry,
            "openpilot Unavailable",
            text2,
            AlertStatus::Normal,
            AlertSize::Mid,
            AudibleAlert::Refuse,
            3.0,
        )
    }

    /// Standard soft-disable countdown alert
    pub fn soft_disable(text2: impl Into<String>) -> Self {
        Self::tiered(
            EventType::SoftDisable,
            "TAKE CONTROL IMMEDIATELY",
            text2,
            AlertStatus::UserPrompt,
            AlertSize::Full,
            AudibleAlert::WarningSoft,
            2.0,
        )
    }

    /// Standard immediate-disable alert
    pub fn immediate_disable(text2: impl Into<String>) -> Self {
        Self::tiered(
            EventType::ImmediateDisable,
            "TAKE CONTROL IMMEDIATELY",
            text2,
            AlertStatus::Critical,
            AlertSize::Full,
            AudibleAlert::WarningImmediate,
            4.0,
        )
    }

    /// Quiet persistent banner; small when there is no second line
    pub fn permanent(text1: impl Into<String>, text2: impl Into<String>) -> Self {
        let text2 = text2.into();
        let size = if text2.is_empty() {
            AlertSize::Small
        } else {
            AlertSize::Mid
        };
        Self::tiered(
            EventType::Permanent,
            text1,
            text2,
            AlertStatus::Normal,
            size,
            AudibleAlert::None,
            0.2,
        )
    }

    /// Set the alert identity
    pub fn with_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = alert_type.into();
        self
    }

    /// Override the tier priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Override the presentation window, in frames
    pub fn with_duration_frames(mut self, frames: i64) -> Self {
        self.duration = frames;
        self
    }

    /// Presentation window in frames, negative durations clamped to 0
    pub fn duration_frames(&self) -> u64 {
        self.duration.max(0) as u64
    }
}
