//! Built-in onroad alert catalogue

use super::{AlertContext, EventName, EventRegistry};
use crate::types::{Alert, AlertSize, AlertStatus, AudibleAlert, EventType, Priority};

pub(super) fn register_all(r: &mut EventRegistry) {
    use EventName::*;
    use EventType::*;

    // Startup

    r.register_static(
        Startup,
        Permanent,
        startup_alert(
            "Be ready to take over at any time",
            "Always keep hands on wheel and eyes on road",
        ),
    );
    r.register_static(
        StartupNoControl,
        Permanent,
        startup_alert("Dashcam mode", "Always keep hands on wheel and eyes on road"),
    );
    r.register_static(StartupNoControl, NoEntry, Alert::no_entry("Dashcam Mode"));
    r.register_static(
        StartupNoCar,
        Permanent,
        startup_alert(
            "Dashcam mode for unsupported car",
            "Always keep hands on wheel and eyes on road",
        ),
    );
    r.register_static(StartupNoCar, NoEntry, Alert::no_entry("Dashcam Mode for Unsupported Car"));

    // Calibration

    r.register_static(
        CalibrationInvalid,
        Permanent,
        Alert::permanent("Calibration Invalid", "Remount Device and Recalibrate"),
    );
    r.register_static(
        CalibrationInvalid,
        SoftDisable,
        Alert::soft_disable("Calibration Invalid: Remount Device & Recalibrate"),
    );
    r.register_static(
        CalibrationInvalid,
        NoEntry,
        Alert::no_entry("Calibration Invalid: Remount Device & Recalibrate"),
    );
    r.register(CalibrationIncomplete, Permanent, calibration_incomplete);
    r.register_static(CalibrationIncomplete, NoEntry, Alert::no_entry("Calibration in Progress"));

    // Collision warnings

    r.register_static(
        StockAeb,
        Permanent,
        Alert::tiered(
            Permanent,
            "BRAKE!",
            "Stock AEB: Risk of Collision",
            AlertStatus::Critical,
            AlertSize::Full,
            AudibleAlert::None,
            2.0,
        )
        .with_priority(Priority::HIGHEST),
    );
    r.register_static(StockAeb, NoEntry, Alert::no_entry("Stock AEB: Risk of Collision"));
    r.register_static(
        StockFcw,
        Permanent,
        Alert::tiered(
            Permanent,
            "BRAKE!",
            "Stock FCW: Risk of Collision",
            AlertStatus::Critical,
            AlertSize::Full,
            AudibleAlert::None,
            2.0,
        )
        .with_priority(Priority::HIGHEST),
    );
    r.register_static(StockFcw, NoEntry, Alert::no_entry("Stock FCW: Risk of Collision"));
    r.register_static(
        Fcw,
        Permanent,
        Alert::tiered(
            Permanent,
            "BRAKE!",
            "Risk of Collision",
            AlertStatus::Critical,
            AlertSize::Full,
            AudibleAlert::WarningSoft,
            2.0,
        )
        .with_priority(Priority::HIGHEST),
    );

    // Driving state

    r.register(PersonalityChanged, Warning, personality_changed);
    r.register(BelowSteerSpeed, Warning, below_steer_speed);
    r.register(BelowEngageSpeed, NoEntry, below_engage_speed);
    r.register_static(
        SpeedTooHigh,
        Warning,
        Alert::tiered(
            Warning,
            "Speed Too High",
            "Model uncertain at this speed",
            AlertStatus::UserPrompt,
            AlertSize::Mid,
            AudibleAlert::PromptRepeat,
            4.0,
        )
        .with_priority(Priority::HIGH),
    );
    r.register_static(SpeedTooHigh, NoEntry, Alert::no_entry("Slow down to engage"));
    r.register_static(
        SteerSaturated,
        Warning,
        Alert::tiered(
            Warning,
            "Take Control",
            "Turn Exceeds Steering Limit",
            AlertStatus::UserPrompt,
            AlertSize::Mid,
            AudibleAlert::PromptRepeat,
            2.0,
        ),
    );
    r.register_static(
        LaneChangeBlocked,
        Warning,
        Alert::tiered(
            Warning,
            "Car Detected in Blindspot",
            "",
            AlertStatus::UserPrompt,
            AlertSize::Small,
            AudibleAlert::Prompt,
            0.1,
        )
        .with_priority(Priority::LOW),
    );

    // Cabin

    r.register_static(DoorOpen, SoftDisable, Alert::soft_disable("Door Open"));
    r.register_static(DoorOpen, NoEntry, Alert::no_entry("Door Open"));
    r.register_static(SeatbeltNotLatched, SoftDisable, Alert::soft_disable("Seatbelt Unlatched"));
    r.register_static(SeatbeltNotLatched, NoEntry, Alert::no_entry("Seatbelt Unlatched"));
    r.register_static(WrongGear, SoftDisable, Alert::soft_disable("Gear not D"));
    r.register_static(WrongGear, NoEntry, Alert::no_entry("Gear not D"));

    // Driver monitoring

    r.register_static(
        PreDriverDistracted,
        Warning,
        Alert::tiered(
            Warning,
            "Pay Attention",
            "",
            AlertStatus::Normal,
            AlertSize::Small,
            AudibleAlert::None,
            0.1,
        )
        .with_priority(Priority::LOW),
    );
    r.register_static(
        DriverDistracted,
        Warning,
        Alert::tiered(
            Warning,
            "DISENGAGE IMMEDIATELY",
            "Driver Distracted",
            AlertStatus::Critical,
            AlertSize::Full,
            AudibleAlert::WarningImmediate,
            0.1,
        )
        .with_priority(Priority::HIGH),
    );

    // System health

    r.register_static(Overheat, SoftDisable, Alert::soft_disable("System Overheated"));
    r.register_static(Overheat, NoEntry, Alert::no_entry("System Overheated"));
    r.register_static(
        LowMemory,
        Permanent,
        Alert::permanent("Low Memory", "Reboot your Device"),
    );
    r.register_static(
        LowMemory,
        SoftDisable,
        Alert::soft_disable("Low Memory: Reboot Your Device"),
    );
    r.register_static(LowMemory, NoEntry, Alert::no_entry("Low Memory: Reboot Your Device"));
    r.register_static(
        SteerTempUnavailable,
        SoftDisable,
        Alert::soft_disable("Steering Temporarily Unavailable"),
    );
    r.register_static(
        SteerTempUnavailable,
        NoEntry,
        Alert::no_entry("Steering Temporarily Unavailable"),
    );
    r.register_static(
        ControlsMismatch,
        ImmediateDisable,
        Alert::immediate_disable("Controls Mismatch"),
    );
    r.register_static(ControlsMismatch, NoEntry, Alert::no_entry("Controls Mismatch"));
    r.register_static(
        CanError,
        ImmediateDisable,
        Alert::immediate_disable("CAN Bus Error: Check Connections"),
    );
    r.register_static(
        CanError,
        Permanent,
        Alert::permanent("CAN Bus Error: Check Connections", ""),
    );
    r.register_static(CanError, NoEntry, Alert::no_entry("CAN Bus Error: Check Connections"));
    r.register_static(
        NoGps,
        Permanent,
        Alert::permanent("Poor GPS reception", "Hardware malfunctioning if sky is visible")
            .with_priority(Priority::LOWER),
    );
}

fn startup_alert(text1: &str, text2: &str) -> Alert {
    Alert::tiered(
        EventType::Permanent,
        text1,
        text2,
        AlertStatus::UserPrompt,
        AlertSize::Mid,
        AudibleAlert::None,
        5.0,
    )
    .with_priority(Priority::LOWER)
}

fn calibration_incomplete(ctx: &AlertContext) -> Option<Alert> {
    let speed = ctx.display_speed(MIN_CALIBRATION_SPEED);
    Some(
        Alert::permanent(
            format!("Calibration in Progress: {}%", ctx.calibration_percent.min(100)),
            format!("Drive Above {}", speed),
        )
        .with_priority(Priority::LOWEST),
    )
}

fn personality_changed(ctx: &AlertContext) -> Option<Alert> {
    Some(Alert::tiered(
        EventType::Warning,
        format!("Driving Personality: {}", ctx.personality.label()),
        "",
        AlertStatus::Normal,
        AlertSize::Small,
        AudibleAlert::Prompt,
        1.0,
    ))
}

fn below_steer_speed(ctx: &AlertContext) -> Option<Alert> {
    Some(
        Alert::tiered(
            EventType::Warning,
            format!(
                "Steer Unavailable Below {}",
                ctx.display_speed(ctx.vehicle.min_steer_speed)
            ),
            "",
            AlertStatus::UserPrompt,
            AlertSize::Small,
            AudibleAlert::Prompt,
            0.4,
        )
        .with_priority(Priority::LOW),
    )
}

fn below_engage_speed(ctx: &AlertContext) -> Option<Alert> {
    Some(Alert::no_entry(format!(
        "Drive above {} to engage",
        ctx.display_speed(ctx.vehicle.min_enable_speed)
    )))
}

/// Calibration only progresses above this speed (m/s)
const MIN_CALIBRATION_SPEED: f64 = 15.0 * 0.277_778;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Personality;

    #[test]
    fn test_stock_aeb_overrides_tier() {
        let registry = EventRegistry::builtin();
        let alert = registry
            .resolve(EventName::StockAeb, EventType::Permanent, &AlertContext::default())
            .unwrap();
        assert_eq!(alert.text1, "BRAKE!");
        assert_eq!(alert.text2, "Stock AEB: Risk of Collision");
        assert_eq!(alert.status, AlertStatus::Critical);
        assert_eq!(alert.priority, Priority::HIGHEST);
        assert_eq!(alert.duration, 200);
    }

    #[test]
    fn test_no_entry_uses_tier_priority() {
        let registry = EventRegistry::builtin();
        let alert = registry
            .resolve(EventName::StartupNoControl, EventType::NoEntry, &AlertContext::default())
            .unwrap();
        assert_eq!(alert.text1, "openpilot Unavailable");
        assert_eq!(alert.text2, "Dashcam Mode");
        assert_eq!(alert.priority, EventType::NoEntry.default_priority());
        assert_eq!(alert.sound, AudibleAlert::Refuse);
    }

    #[test]
    fn test_personality_text() {
        let registry = EventRegistry::builtin();
        let mut ctx = AlertContext::default();
        for personality in Personality::all() {
            ctx.personality = *personality;
            let alert = registry
                .resolve(EventName::PersonalityChanged, EventType::Warning, &ctx)
                .unwrap();
            assert_eq!(
                alert.text1,
                format!("Driving Personality: {}", personality.label())
            );
        }
    }

    #[test]
    fn test_below_steer_speed_units() {
        let registry = EventRegistry::builtin();
        let mut ctx = AlertContext::default();
        ctx.vehicle.min_steer_speed = 12.5;

        let metric = registry
            .resolve(EventName::BelowSteerSpeed, EventType::Warning, &ctx)
            .unwrap();
        assert_eq!(metric.text1, "Steer Unavailable Below 45 km/h");

        ctx.is_metric = false;
        let imperial = registry
            .resolve(EventName::BelowSteerSpeed, EventType::Warning, &ctx)
            .unwrap();
        assert_eq!(imperial.text1, "Steer Unavailable Below 28 mph");
    }

    #[test]
    fn test_calibration_progress() {
        let registry = EventRegistry::builtin();
        let ctx = AlertContext {
            calibration_percent: 40,
            ..Default::default()
        };
        let alert = registry
            .resolve(EventName::CalibrationIncomplete, EventType::Permanent, &ctx)
            .unwrap();
        assert_eq!(alert.text1, "Calibration in Progress: 40%");
        assert_eq!(alert.text2, "Drive Above 15 km/h");
    }
}
