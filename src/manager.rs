//! Alert manager — per-frame priority arbitration
//!
//! The manager owns the table of active alerts for the lifetime of a
//! publisher. Each frame the driver clears the raised set, adds the alerts
//! resolved for that frame, and asks for the single alert to present.
//!
//! Windows are half-open: an alert added at frame `F` with duration `D > 0`
//! is presented for frames `F..F + D`; a zero-duration alert only for `F`.
//! Re-adding an alert while its window is open moves the end of the window
//! to `frame + D` and keeps the original first frame.

use crate::types::Alert;
use std::collections::HashMap;

/// An alert tracked across frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    pub alert: Alert,

    /// Frame the alert was first added at
    pub first_frame: u64,

    /// First frame the alert is no longer presented at
    pub expires_at_frame: u64,

    /// Insertion order of the last add, used for tie-breaking
    added_seq: u64,
}

impl ActiveAlert {
    /// Whether the alert is still presented at `frame`
    pub fn is_active(&self, frame: u64) -> bool {
        frame < self.expires_at_frame
    }
}

/// Stateful arbiter selecting one alert per frame
#[derive(Debug, Default)]
pub struct AlertManager {
    /// Active alerts keyed by alert identity
    alerts: HashMap<String, ActiveAlert>,

    /// Identities raised since the last `clear`
    raised: Vec<String>,

    next_seq: u64,

    /// Alert selected by the last `process_alerts` call
    current: Option<Alert>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget which alerts were raised this frame
    ///
    /// The active table is left untouched; sticky alerts keep running.
    pub fn clear(&mut self) {
        self.raised.clear();
    }

    /// Add or refresh alerts raised at `frame`
    pub fn add_many(&mut self, frame: u64, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            let seq = self.bump_seq();
            let expires_at_frame = window_end(frame, &alert);
            let identity = alert.alert_type.clone();

            match self.alerts.get_mut(&identity) {
                Some(entry) if entry.is_active(frame) => {
                    entry.expires_at_frame = expires_at_frame;
                    entry.added_seq = seq;
                    entry.alert = alert;
                }
                _ => {
                    tracing::debug!(
                        alert_type = %identity,
                        frame,
                        expires_at_frame,
                        priority = alert.priority.0,
                        "Alert activated"
                    );
                    self.alerts.insert(
                        identity.clone(),
                        ActiveAlert {
                            alert,
                            first_frame: frame,
                            expires_at_frame,
                            added_seq: seq,
                        },
                    );
                }
            }

            if !self.raised.contains(&identity) {
                self.raised.push(identity);
            }
        }
    }

    /// Select the alert to present at `frame`
    ///
    /// Expired alerts are dropped first, then `one_shots` join the candidates
    /// for this call only. The highest `priority` wins; on a tie the most
    /// recently added alert wins, one-shots counting as added last.
    pub fn process_alerts(&mut self, frame: u64, one_shots: &[Alert]) -> Option<Alert> {
        self.alerts.retain(|identity, entry| {
            let keep = entry.is_active(frame);
            if !keep {
                tracing::debug!(alert_type = %identity, frame, "Alert expired");
            }
            keep
        });

        let base = self.next_seq;
        let selected = self
            .alerts
            .values()
            .map(|entry| (entry.alert.priority, entry.added_seq, &entry.alert))
            .chain(
                one_shots
                    .iter()
                    .enumerate()
                    .map(|(i, alert)| (alert.priority, base + i as u64, alert)),
            )
            .max_by_key(|(priority, seq, _)| (*priority, *seq))
            .map(|(_, _, alert)| alert.clone());

        let changed = match (&self.current, &selected) {
            (Some(prev), Some(next)) => prev.alert_type != next.alert_type,
            (None, None) => false,
            _ => true,
        };
        if changed {
            tracing::debug!(
                frame,
                alert_type = selected.as_ref().map(|a| a.alert_type.as_str()).unwrap_or(""),
                "Selected alert changed"
            );
        }

        self.current = selected.clone();
        selected
    }

    /// Tracked entry for an alert identity
    pub fn get(&self, alert_type: &str) -> Option<&ActiveAlert> {
        self.alerts.get(alert_type)
    }

    /// Number of tracked alerts, including any not yet garbage-collected
    pub fn active_count(&self) -> usize {
        self.alerts.len()
    }

    /// Identities raised since the last `clear`, in add order
    pub fn raised(&self) -> &[String] {
        &self.raised
    }

    /// Alert selected by the last `process_alerts` call
    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    /// Drop every tracked alert
    pub fn reset(&mut self) {
        self.alerts.clear();
        self.raised.clear();
        self.current = None;
        self.next_seq = 0;
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

fn window_end(frame: u64, alert: &Alert) -> u64 {
    frame.saturating_add(alert.duration_frames().max(1))
}
