//! Event schedules — which events are raised on which frame
//!
//! A schedule stands in for the controller that would normally evaluate
//! sensors and raise events. The publisher asks it once per frame.

use crate::events::{EventName, EventRegistry};
use crate::types::EventType;
use std::collections::BTreeMap;

/// Source of raised events, queried once per frame
pub trait EventSchedule: Send {
    /// Events raised at `frame`, each paired with the type to resolve it under
    fn raised(&mut self, frame: u64) -> Vec<(EventName, EventType)>;

    /// Whether the schedule has nothing left to raise from `frame` on
    fn is_finished(&self, _frame: u64) -> bool {
        false
    }

    /// Whether `frame` opens a new step; alerts raised by earlier steps are
    /// dropped before the step's own events are raised
    fn step_started(&self, _frame: u64) -> bool {
        false
    }
}

/// Raises nothing; the publisher only emits heartbeats
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleSchedule;

impl EventSchedule for IdleSchedule {
    fn raised(&mut self, _frame: u64) -> Vec<(EventName, EventType)> {
        Vec::new()
    }
}

/// Steps through a list of `(event, type)` pairs, holding each one raised for
/// `hold_frames` consecutive frames
#[derive(Debug, Clone)]
pub struct CycleSchedule {
    steps: Vec<(EventName, EventType)>,
    hold_frames: u64,
    repeat: bool,
}

impl CycleSchedule {
    pub fn new(steps: Vec<(EventName, EventType)>, hold_frames: u64) -> Self {
        Self {
            steps,
            hold_frames: hold_frames.max(1),
            repeat: false,
        }
    }

    /// Cycle through every pair the registry knows
    pub fn all(registry: &EventRegistry, hold_frames: u64) -> Self {
        Self::new(registry.iter().collect(), hold_frames)
    }

    /// Start over after the last step instead of finishing
    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn steps(&self) -> &[(EventName, EventType)] {
        &self.steps
    }

    /// Frames one pass through the steps takes
    pub fn period(&self) -> u64 {
        self.steps.len() as u64 * self.hold_frames
    }

    /// Step active at `frame`, if any
    pub fn step_at(&self, frame: u64) -> Option<(EventName, EventType)> {
        if self.steps.is_empty() {
            return None;
        }
        let index = frame / self.hold_frames;
        if !self.repeat && index >= self.steps.len() as u64 {
            return None;
        }
        Some(self.steps[(index % self.steps.len() as u64) as usize])
    }
}

impl EventSchedule for CycleSchedule {
    fn raised(&mut self, frame: u64) -> Vec<(EventName, EventType)> {
        self.step_at(frame).into_iter().collect()
    }

    fn is_finished(&self, frame: u64) -> bool {
        self.steps.is_empty() || (!self.repeat && frame >= self.period())
    }

    // The frame right after the last step is a boundary too, so a finished
    // cycle does not leave its last alert up past its hold.
    fn step_started(&self, frame: u64) -> bool {
        !self.steps.is_empty()
            && frame % self.hold_frames == 0
            && (self.repeat || frame <= self.period())
    }
}

/// Frame-indexed raises, for scripted scenarios
#[derive(Debug, Clone, Default)]
pub struct ScriptedSchedule {
    raises: BTreeMap<u64, Vec<(EventName, EventType)>>,
    end_frame: Option<u64>,
}

impl ScriptedSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `name` under `event_type` at a single frame
    pub fn at(mut self, frame: u64, name: EventName, event_type: EventType) -> Self {
        self.raises.entry(frame).or_default().push((name, event_type));
        self
    }

    /// Raise `name` under `event_type` on every frame of `frames`
    pub fn hold(
        mut self,
        frames: std::ops::Range<u64>,
        name: EventName,
        event_type: EventType,
    ) -> Self {
        for frame in frames {
            self = self.at(frame, name, event_type);
        }
        self
    }

    /// Report the schedule finished from `frame` on
    pub fn until(mut self, frame: u64) -> Self {
        self.end_frame = Some(frame);
        self
    }
}

impl EventSchedule for ScriptedSchedule {
    fn raised(&mut self, frame: u64) -> Vec<(EventName, EventType)> {
        self.raises.get(&frame).cloned().unwrap_or_default()
    }

    fn is_finished(&self, frame: u64) -> bool {
        self.end_frame.is_some_and(|end| frame >= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<(EventName, EventType)> {
        vec![
            (EventName::StartupNoControl, EventType::NoEntry),
            (EventName::CalibrationInvalid, EventType::Permanent),
            (EventName::StockAeb, EventType::Permanent),
        ]
    }

    #[test]
    fn test_cycle_holds_each_step() {
        let mut schedule = CycleSchedule::new(pairs(), 200);
        assert_eq!(schedule.period(), 600);
        assert_eq!(schedule.raised(0), vec![pairs()[0]]);
        assert_eq!(schedule.raised(199), vec![pairs()[0]]);
        assert_eq!(schedule.raised(200), vec![pairs()[1]]);
        assert_eq!(schedule.raised(599), vec![pairs()[2]]);
    }

    #[test]
    fn test_cycle_finishes_without_repeat() {
        let mut schedule = CycleSchedule::new(pairs(), 10);
        assert!(!schedule.is_finished(29));
        assert!(schedule.is_finished(30));
        assert!(schedule.raised(30).is_empty());
    }

    #[test]
    fn test_cycle_repeats() {
        let mut schedule = CycleSchedule::new(pairs(), 10).repeating(true);
        assert!(!schedule.is_finished(1_000));
        assert_eq!(schedule.raised(30), vec![pairs()[0]]);
        assert_eq!(schedule.raised(55), vec![pairs()[2]]);
    }

    #[test]
    fn test_cycle_step_boundaries() {
        let schedule = CycleSchedule::new(pairs(), 10);
        assert!(schedule.step_started(0));
        assert!(!schedule.step_started(9));
        assert!(schedule.step_started(10));
        assert!(schedule.step_started(30));
        assert!(!schedule.step_started(40));

        let repeating = CycleSchedule::new(pairs(), 10).repeating(true);
        assert!(repeating.step_started(40));
        assert!(!repeating.step_started(41));

        assert!(!CycleSchedule::new(Vec::new(), 10).step_started(0));
        assert!(!IdleSchedule.step_started(0));
        assert!(!ScriptedSchedule::new().step_started(0));
    }

    #[test]
    fn test_empty_cycle_is_finished() {
        let mut schedule = CycleSchedule::new(Vec::new(), 10).repeating(true);
        assert!(schedule.is_finished(0));
        assert!(schedule.raised(0).is_empty());
    }

    #[test]
    fn test_cycle_all_covers_registry() {
        let registry = EventRegistry::builtin();
        let schedule = CycleSchedule::all(&registry, 5);
        assert_eq!(schedule.steps().len(), registry.len());
    }

    #[test]
    fn test_scripted_schedule() {
        let mut schedule = ScriptedSchedule::new()
            .at(0, EventName::Fcw, EventType::Permanent)
            .hold(2..4, EventName::DoorOpen, EventType::NoEntry)
            .until(10);

        assert_eq!(schedule.raised(0), vec![(EventName::Fcw, EventType::Permanent)]);
        assert!(schedule.raised(1).is_empty());
        assert_eq!(schedule.raised(3), vec![(EventName::DoorOpen, EventType::NoEntry)]);
        assert!(schedule.raised(4).is_empty());
        assert!(!schedule.is_finished(9));
        assert!(schedule.is_finished(10));
    }

    #[test]
    fn test_idle_schedule() {
        let mut schedule = IdleSchedule;
        assert!(schedule.raised(0).is_empty());
        assert!(!schedule.is_finished(u64::MAX));
    }
}
