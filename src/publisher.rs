//! Publisher loop — fixed-rate arbitration and state broadcast
//!
//! Once per control tick the loop raises the schedule's events, lets the
//! alert manager pick the alert to present, and publishes one envelope per
//! channel. Every envelope of a tick carries the same frame number, and the
//! whole snapshot is built before the first publish so a stop request can
//! never split a tick.

use crate::bus::ChannelBus;
use crate::events::{AlertContext, EventRegistry, EventSet};
use crate::manager::AlertManager;
use crate::messages::{
    channels, AlertState, DeviceState, Envelope, HardwareUnit, Message, UnitType,
};
use crate::replay::ReplaySource;
use crate::schedule::EventSchedule;
use crate::types::{Alert, EventType};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Tick period
    pub tick: Duration,

    /// Stop after this many ticks
    pub max_ticks: Option<u64>,

    /// `enabled` flag reported on `alertState`
    pub enabled: bool,

    /// `started` flag reported on `deviceState`
    pub started: bool,

    /// Units reported on `hardwareState`
    pub hardware: Vec<HardwareUnit>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            max_ticks: None,
            enabled: false,
            started: true,
            hardware: vec![HardwareUnit {
                ignition_line: true,
                unit_type: UnitType::Dos,
            }],
        }
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub ticks: u64,
    pub published: u64,
    pub publish_errors: u64,
    pub overruns: u64,
    pub seeded: u64,
}

/// Everything published for one frame
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub frame: u64,
    pub mono_time_ns: u64,

    /// Alert selected for the frame
    pub alert: Option<Alert>,

    /// Envelopes in publish order
    pub envelopes: Vec<Envelope>,
}

/// Fixed-rate driver of the alert manager
///
/// Owns the manager and the frame counter together, so `reset` always
/// restarts both.
pub struct PublisherLoop {
    bus: Arc<dyn ChannelBus>,
    registry: EventRegistry,
    schedule: Box<dyn EventSchedule>,
    context: AlertContext,
    replay: Option<Box<dyn ReplaySource>>,
    manager: AlertManager,
    events: EventSet,
    one_shots: Vec<Alert>,
    config: PublisherConfig,
    frame: u64,
    stats: PublisherStats,
}

impl PublisherLoop {
    pub fn new(
        bus: Arc<dyn ChannelBus>,
        registry: EventRegistry,
        schedule: Box<dyn EventSchedule>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            bus,
            registry,
            schedule,
            context: AlertContext::default(),
            replay: None,
            manager: AlertManager::new(),
            events: EventSet::new(),
            one_shots: Vec::new(),
            config,
            frame: 0,
            stats: PublisherStats::default(),
        }
    }

    /// Use `context` when resolving alerts
    pub fn with_context(mut self, context: AlertContext) -> Self {
        self.context = context;
        self
    }

    /// Seed auxiliary channels from `replay` before the first tick
    pub fn with_replay(mut self, replay: Box<dyn ReplaySource>) -> Self {
        self.replay = Some(replay);
        self
    }

    /// Next frame to be published
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn manager(&self) -> &AlertManager {
        &self.manager
    }

    pub fn context_mut(&mut self) -> &mut AlertContext {
        &mut self.context
    }

    pub fn stats(&self) -> &PublisherStats {
        &self.stats
    }

    /// Present `alert` for the next frame only
    pub fn push_one_shot(&mut self, alert: Alert) {
        self.one_shots.push(alert);
    }

    /// Restart from frame 0 with an empty manager
    pub fn reset(&mut self) {
        self.frame = 0;
        self.manager.reset();
        self.events.clear();
        self.one_shots.clear();
        self.stats = PublisherStats::default();
    }

    /// Arbitrate the current frame and build its snapshot
    ///
    /// Advances the frame counter; nothing is published.
    pub fn step(&mut self) -> TickSnapshot {
        let frame = self.frame;
        self.raise_events(frame);

        let one_shots = std::mem::take(&mut self.one_shots);
        let alert = self.manager.process_alerts(frame, &one_shots);

        let mono_time_ns = self.mono_time_ns(frame);
        let envelopes = vec![
            Envelope::new(
                channels::ALERT_STATE,
                frame,
                mono_time_ns,
                Message::AlertState(AlertState::from_alert(alert.as_ref(), self.config.enabled)),
            ),
            Envelope::new(
                channels::DEVICE_STATE,
                frame,
                mono_time_ns,
                Message::DeviceState(DeviceState {
                    started: self.config.started,
                }),
            ),
            Envelope::new(
                channels::HARDWARE_STATE,
                frame,
                mono_time_ns,
                Message::HardwareState(self.config.hardware.clone()),
            ),
        ];

        self.frame += 1;

        TickSnapshot {
            frame,
            mono_time_ns,
            alert,
            envelopes,
        }
    }

    /// Arbitrate and publish one frame
    pub async fn tick(&mut self) -> TickSnapshot {
        let snapshot = self.step();
        self.publish_snapshot(&snapshot).await;
        self.stats.ticks += 1;
        snapshot
    }

    /// Publish the replay seeds, if a replay source is attached
    pub async fn seed(&mut self) {
        let Some(mut replay) = self.replay.take() else {
            return;
        };

        let seeds = match replay.initial_messages() {
            Ok(seeds) => seeds,
            Err(e) => {
                tracing::warn!(source = replay.name(), error = %e, "Failed to read replay seeds");
                return;
            }
        };

        let mono_time_ns = self.mono_time_ns(self.frame);
        for seed in seeds {
            let envelope = Envelope::new(
                seed.channel,
                self.frame,
                mono_time_ns,
                Message::Replay(seed.data),
            );
            match self.bus.publish(&envelope).await {
                Ok(_) => self.stats.seeded += 1,
                Err(e) => {
                    self.stats.publish_errors += 1;
                    tracing::warn!(
                        channel = %envelope.channel,
                        error = %e,
                        "Failed to publish replay seed"
                    );
                }
            }
        }

        tracing::info!(
            source = replay.name(),
            seeded = self.stats.seeded,
            "Replay seeds published"
        );
    }

    /// Run until `stop` turns true, the tick limit is reached, or the
    /// schedule is exhausted and no alert remains on screen
    ///
    /// The stop signal is only observed between ticks.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> PublisherStats {
        self.seed().await;

        let period = self.config.tick.max(Duration::from_micros(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            bus = self.bus.name(),
            tick_us = period.as_micros() as u64,
            max_ticks = ?self.config.max_ticks,
            frame = self.frame,
            "Publisher loop started"
        );

        loop {
            if *stop.borrow() || self.is_done() {
                break;
            }

            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Stop sender dropped");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            self.tick().await;
            let elapsed = started.elapsed();
            if elapsed > period {
                self.stats.overruns += 1;
                tracing::warn!(
                    frame = self.frame - 1,
                    elapsed_us = elapsed.as_micros() as u64,
                    "Tick overran its period"
                );
            }
        }

        if let Err(e) = self.bus.flush().await {
            tracing::warn!(error = %e, "Failed to flush bus on stop");
        }

        tracing::info!(
            ticks = self.stats.ticks,
            published = self.stats.published,
            publish_errors = self.stats.publish_errors,
            overruns = self.stats.overruns,
            "Publisher loop stopped"
        );

        self.stats.clone()
    }

    fn is_done(&self) -> bool {
        if self
            .config
            .max_ticks
            .is_some_and(|max| self.stats.ticks >= max)
        {
            return true;
        }
        self.schedule.is_finished(self.frame) && self.manager.current().is_none()
    }

    /// Resolve this frame's raised events and hand them to the manager
    fn raise_events(&mut self, frame: u64) {
        if self.schedule.step_started(frame) {
            tracing::debug!(frame, "Schedule step started, dropping earlier alerts");
            self.manager.reset();
        }
        self.manager.clear();
        self.context.frame = frame;

        let raised = self.schedule.raised(frame);
        let mut types: Vec<EventType> = Vec::new();
        for (_, event_type) in &raised {
            if !types.contains(event_type) {
                types.push(*event_type);
            }
        }

        let mut alerts = Vec::new();
        for event_type in types {
            self.events.clear();
            for (name, _) in raised.iter().filter(|(_, et)| *et == event_type) {
                self.events.add(*name);
            }
            alerts.extend(
                self.events
                    .create_alerts(&self.registry, &[event_type], &self.context),
            );
        }

        self.manager.add_many(frame, alerts);
    }

    async fn publish_snapshot(&mut self, snapshot: &TickSnapshot) {
        for envelope in &snapshot.envelopes {
            match self.bus.publish(envelope).await {
                Ok(sequence) => {
                    self.stats.published += 1;
                    tracing::trace!(
                        channel = %envelope.channel,
                        frame = snapshot.frame,
                        sequence,
                        "Published"
                    );
                }
                Err(e) => {
                    self.stats.publish_errors += 1;
                    tracing::warn!(
                        channel = %envelope.channel,
                        frame = snapshot.frame,
                        error = %e,
                        "Publish failed, continuing"
                    );
                }
            }
        }
    }

    fn mono_time_ns(&self, frame: u64) -> u64 {
        frame.saturating_mul(self.config.tick.as_nanos() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::memory::MemoryBus;
    use crate::bus::{BusInfo, Subscription};
    use crate::error::{AlertError, Result};
    use crate::events::EventName;
    use crate::replay::StaticReplay;
    use crate::schedule::{CycleSchedule, IdleSchedule, ScriptedSchedule};
    use crate::types::{AlertSize, AlertStatus, AudibleAlert, Priority};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn publisher(schedule: Box<dyn EventSchedule>) -> (Arc<MemoryBus>, PublisherLoop) {
        let bus = Arc::new(MemoryBus::default());
        let publisher = PublisherLoop::new(
            bus.clone(),
            EventRegistry::builtin(),
            schedule,
            PublisherConfig::default(),
        );
        (bus, publisher)
    }

    /// Bus that rejects every other publish
    struct FlakyBus {
        calls: AtomicU64,
    }

    #[async_trait]
    impl ChannelBus for FlakyBus {
        async fn publish(&self, envelope: &Envelope) -> Result<u64> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                return Err(AlertError::Publish {
                    channel: envelope.channel.clone(),
                    reason: "injected".to_string(),
                });
            }
            Ok(n)
        }

        async fn subscribe(&self, _channels: &[&str]) -> Result<Box<dyn Subscription>> {
            Err(AlertError::Subscribe {
                channel: "*".to_string(),
                reason: "unsupported".to_string(),
            })
        }

        async fn info(&self) -> Result<BusInfo> {
            Ok(BusInfo {
                bus: "flaky".to_string(),
                published: self.calls.load(Ordering::SeqCst),
                subscribers: 0,
            })
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn test_step_builds_consistent_snapshot() {
        let (_, mut publisher) = publisher(Box::new(IdleSchedule));
        let snapshot = publisher.step();

        assert_eq!(snapshot.frame, 0);
        assert!(snapshot.alert.is_none());
        let channels: Vec<_> = snapshot.envelopes.iter().map(|e| e.channel.as_str()).collect();
        assert_eq!(channels, channels::TICK_CHANNELS.to_vec());
        assert!(snapshot.envelopes.iter().all(|e| e.frame == 0));
        assert_eq!(publisher.frame(), 1);

        let next = publisher.step();
        assert_eq!(next.frame, 1);
        assert_eq!(next.mono_time_ns, 10_000_000);
    }

    #[test]
    fn test_step_reports_selected_alert() {
        let schedule = ScriptedSchedule::new().at(0, EventName::StockAeb, EventType::Permanent);
        let (_, mut publisher) = publisher(Box::new(schedule));

        let snapshot = publisher.step();
        let state = snapshot.envelopes[0].alert_state().unwrap();
        assert_eq!(state.alert_text1, "BRAKE!");
        assert_eq!(state.alert_type, "stockAeb/permanent");
        assert!(!state.enabled);
    }

    #[test]
    fn test_alert_stays_for_its_window() {
        // stockAeb/permanent lasts 2 s = 200 frames once raised
        let schedule = ScriptedSchedule::new().at(0, EventName::StockAeb, EventType::Permanent);
        let (_, mut publisher) = publisher(Box::new(schedule));

        for frame in 0..200 {
            let snapshot = publisher.step();
            assert_eq!(
                snapshot.alert.as_ref().map(|a| a.alert_type.as_str()),
                Some("stockAeb/permanent"),
                "frame {}",
                frame
            );
        }
        assert!(publisher.step().alert.is_none());
    }

    #[test]
    fn test_mixed_types_in_one_frame() {
        let schedule = ScriptedSchedule::new()
            .at(0, EventName::DoorOpen, EventType::NoEntry)
            .at(0, EventName::CanError, EventType::ImmediateDisable);
        let (_, mut publisher) = publisher(Box::new(schedule));

        let snapshot = publisher.step();
        assert_eq!(
            snapshot.alert.unwrap().alert_type,
            "canError/immediateDisable"
        );
        assert_eq!(
            publisher.manager().raised(),
            &["doorOpen/noEntry".to_string(), "canError/immediateDisable".to_string()]
        );
    }

    #[test]
    fn test_one_shot_preempts_for_one_frame() {
        let (_, mut publisher) = publisher(Box::new(IdleSchedule));
        publisher.push_one_shot(
            Alert::new(
                "Flash",
                "",
                AlertStatus::Normal,
                AlertSize::Small,
                Priority::LOW,
                AudibleAlert::None,
                5.0,
            )
            .with_type("flash"),
        );

        assert_eq!(publisher.step().alert.unwrap().alert_type, "flash");
        assert!(publisher.step().alert.is_none());
    }

    #[test]
    fn test_reset_restarts_frame_and_manager() {
        let schedule = ScriptedSchedule::new().at(0, EventName::Fcw, EventType::Permanent);
        let (_, mut publisher) = publisher(Box::new(schedule));
        publisher.step();
        publisher.step();

        publisher.reset();
        assert_eq!(publisher.frame(), 0);
        assert_eq!(publisher.manager().active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_each_channel_once_per_tick() {
        let (bus, mut publisher) = publisher(Box::new(IdleSchedule));
        publisher.config.max_ticks = Some(25);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let stats = publisher.run(stop_rx).await;
        assert_eq!(stats.ticks, 25);
        assert_eq!(stats.published, 75);
        assert_eq!(stats.publish_errors, 0);

        for channel in channels::TICK_CHANNELS {
            let frames: Vec<u64> = bus
                .history(Some(channel), 100)
                .await
                .iter()
                .map(|e| e.frame)
                .collect();
            assert_eq!(frames, (0..25).collect::<Vec<_>>(), "channel {}", channel);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_signal() {
        let (_, mut publisher) = publisher(Box::new(IdleSchedule));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let stats = publisher.run(stop_rx).await;
            (stats, publisher)
        });

        tokio::time::sleep(Duration::from_millis(105)).await;
        stop_tx.send(true).unwrap();

        let (stats, publisher) = handle.await.unwrap();
        assert!(stats.ticks >= 10 && stats.ticks <= 12, "ticks {}", stats.ticks);
        assert_eq!(stats.published, stats.ticks * 3);
        assert_eq!(publisher.frame(), stats.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_stop_already_set() {
        let (_, mut publisher) = publisher(Box::new(IdleSchedule));
        let (_stop_tx, stop_rx) = watch::channel(true);
        let stats = publisher.run(stop_rx).await;
        assert_eq!(stats.ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_when_cycle_exhausted() {
        let schedule = CycleSchedule::new(
            vec![(EventName::PreDriverDistracted, EventType::Warning)],
            5,
        );
        let (_, mut publisher) = publisher(Box::new(schedule));
        let (_stop_tx, stop_rx) = watch::channel(false);

        let stats = publisher.run(stop_rx).await;
        // 5 raised frames, then the boundary at frame 5 clears the 10-frame alert
        assert_eq!(stats.ticks, 6);
        assert!(publisher.manager().current().is_none());
    }

    #[test]
    fn test_cycle_step_replaces_higher_priority_alert() {
        // fcw/permanent outranks startupNoControl/noEntry and outlasts its hold
        let schedule = CycleSchedule::new(
            vec![
                (EventName::Fcw, EventType::Permanent),
                (EventName::StartupNoControl, EventType::NoEntry),
            ],
            50,
        )
        .repeating(true);
        let (_, mut publisher) = publisher(Box::new(schedule));

        for frame in 0..200u64 {
            let expected = if (frame / 50) % 2 == 0 {
                "fcw/permanent"
            } else {
                "startupNoControl/noEntry"
            };
            let snapshot = publisher.step();
            assert_eq!(
                snapshot.alert.map(|a| a.alert_type).as_deref(),
                Some(expected),
                "frame {}",
                frame
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_do_not_stop_loop() {
        let bus = Arc::new(FlakyBus {
            calls: AtomicU64::new(0),
        });
        let mut publisher = PublisherLoop::new(
            bus,
            EventRegistry::builtin(),
            Box::new(IdleSchedule),
            PublisherConfig {
                max_ticks: Some(4),
                ..Default::default()
            },
        );
        let (_stop_tx, stop_rx) = watch::channel(false);

        let stats = publisher.run(stop_rx).await;
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.published + stats.publish_errors, 12);
        assert_eq!(stats.publish_errors, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_seeds_published_before_first_tick() {
        let (bus, publisher) = publisher(Box::new(IdleSchedule));
        let mut publisher = publisher.with_replay(Box::new(
            StaticReplay::new("fixture").with_seed("carState", serde_json::json!({"vEgo": 3.0})),
        ));
        publisher.config.max_ticks = Some(2);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let stats = publisher.run(stop_rx).await;
        assert_eq!(stats.seeded, 1);

        let history = bus.history(None, 100).await;
        assert_eq!(history[0].channel, "carState");
        assert_eq!(history[0].frame, 0);
        assert_eq!(history.len(), 7);
    }
}
