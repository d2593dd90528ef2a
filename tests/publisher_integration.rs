//! Publisher loop integration tests over the in-memory bus

use std::sync::Arc;
use std::time::Duration;

use onroad_alerts::{
    alert_identity, channels, ChannelBus, CycleSchedule, EventName, EventRegistry, EventType,
    MemoryBus, Message, PublisherConfig, PublisherLoop, ScriptedSchedule,
};
use tokio::sync::watch;

fn default_steps() -> Vec<(EventName, EventType)> {
    vec![
        (EventName::StartupNoControl, EventType::NoEntry),
        (EventName::CalibrationInvalid, EventType::Permanent),
        (EventName::StockAeb, EventType::Permanent),
        (EventName::Fcw, EventType::Permanent),
    ]
}

fn default_scenario() -> CycleSchedule {
    CycleSchedule::new(default_steps(), 200).repeating(true)
}

async fn alert_types(bus: &MemoryBus, limit: usize) -> Vec<String> {
    bus.history(Some(channels::ALERT_STATE), limit)
        .await
        .iter()
        .map(|env| env.alert_state().unwrap().alert_type.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_consistent_ticks() {
    let bus = Arc::new(MemoryBus::default());
    let mut sub = bus.subscribe(&[]).await.unwrap();

    let mut publisher = PublisherLoop::new(
        bus.clone(),
        EventRegistry::builtin(),
        Box::new(default_scenario()),
        PublisherConfig {
            max_ticks: Some(50),
            ..Default::default()
        },
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let stats = publisher.run(stop_rx).await;
    assert_eq!(stats.published, 150);

    let mut last_frame = None;
    for _ in 0..50 {
        let alert = sub.next().await.unwrap().unwrap();
        let device = sub.next().await.unwrap().unwrap();
        let hardware = sub.next().await.unwrap().unwrap();

        assert_eq!(alert.channel, channels::ALERT_STATE);
        assert_eq!(device.channel, channels::DEVICE_STATE);
        assert_eq!(hardware.channel, channels::HARDWARE_STATE);
        assert_eq!(alert.frame, device.frame);
        assert_eq!(alert.frame, hardware.frame);
        assert_eq!(alert.mono_time_ns, hardware.mono_time_ns);

        if let Some(last) = last_frame {
            assert!(alert.frame > last);
        }
        last_frame = Some(alert.frame);

        let state = alert.alert_state().unwrap();
        assert_eq!(state.alert_type, "startupNoControl/noEntry");
        assert!(matches!(device.message, Message::DeviceState(ref d) if d.started));
        assert!(matches!(hardware.message, Message::HardwareState(ref units) if units.len() == 1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_advances_between_alerts() {
    let bus = Arc::new(MemoryBus::default());
    let mut publisher = PublisherLoop::new(
        bus.clone(),
        EventRegistry::builtin(),
        Box::new(default_scenario()),
        PublisherConfig {
            max_ticks: Some(450),
            ..Default::default()
        },
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    publisher.run(stop_rx).await;

    let states = bus.history(Some(channels::ALERT_STATE), 1_000).await;
    assert_eq!(states.len(), 450);

    let type_at = |frame: usize| states[frame].alert_state().unwrap().alert_type.clone();
    assert_eq!(type_at(0), "startupNoControl/noEntry");
    // Higher-tier permanent takes over as soon as it is raised
    assert_eq!(type_at(200), "calibrationInvalid/permanent");
    assert_eq!(type_at(449), "stockAeb/permanent");
}

#[tokio::test(start_paused = true)]
async fn test_repeating_cycle_shows_every_step_for_its_hold() {
    let bus = Arc::new(MemoryBus::default());
    let mut publisher = PublisherLoop::new(
        bus.clone(),
        EventRegistry::builtin(),
        Box::new(default_scenario()),
        PublisherConfig {
            max_ticks: Some(1_700),
            ..Default::default()
        },
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    publisher.run(stop_rx).await;

    let types = alert_types(&bus, 2_000).await;
    assert_eq!(types.len(), 1_700);

    let steps = default_steps();
    for (frame, alert_type) in types.iter().enumerate() {
        let (name, et) = steps[(frame / 200) % steps.len()];
        assert_eq!(*alert_type, alert_identity(name, et), "frame {}", frame);
    }
}

#[tokio::test(start_paused = true)]
async fn test_all_alerts_cycle_shows_every_alert() {
    let registry = EventRegistry::builtin();
    let pairs: Vec<_> = registry.iter().collect();
    let hold = 3;

    let bus = Arc::new(MemoryBus::default());
    let mut publisher = PublisherLoop::new(
        bus.clone(),
        registry.clone(),
        Box::new(CycleSchedule::all(&registry, hold)),
        PublisherConfig::default(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let stats = publisher.run(stop_rx).await;
    assert_eq!(stats.ticks, pairs.len() as u64 * hold + 1);

    let types = alert_types(&bus, 10_000).await;
    for (i, (name, et)) in pairs.iter().enumerate() {
        let expected = alert_identity(*name, *et);
        for frame in i * hold as usize..(i + 1) * hold as usize {
            assert_eq!(types[frame], expected, "frame {}", frame);
        }
    }
    // Final frame clears the screen
    assert_eq!(types.last().map(String::as_str), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_stop_takes_effect_between_ticks() {
    let bus = Arc::new(MemoryBus::default());
    let mut publisher = PublisherLoop::new(
        bus.clone(),
        EventRegistry::builtin(),
        Box::new(ScriptedSchedule::new().hold(0..1_000, EventName::Fcw, EventType::Permanent)),
        PublisherConfig::default(),
    );
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { publisher.run(stop_rx).await });
    tokio::time::sleep(Duration::from_millis(55)).await;
    stop_tx.send(true).unwrap();
    let stats = handle.await.unwrap();

    // Every tick that started was published on all three channels
    for channel in channels::TICK_CHANNELS {
        let history = bus.history(Some(channel), 1_000).await;
        assert_eq!(history.len() as u64, stats.ticks, "channel {}", channel);
    }
}

#[tokio::test(start_paused = true)]
async fn test_dropped_stop_sender_ends_loop() {
    let bus = Arc::new(MemoryBus::default());
    let mut publisher = PublisherLoop::new(
        bus,
        EventRegistry::builtin(),
        Box::new(default_scenario()),
        PublisherConfig::default(),
    );
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { publisher.run(stop_rx).await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    drop(stop_tx);

    let stats = handle.await.unwrap();
    assert!(stats.ticks > 0);
}
