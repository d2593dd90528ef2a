use tokio::sync::watch;

use crate::config::{Scenario, SimConfig};
use crate::error::Result;
use crate::events::EventRegistry;
use crate::process::{CommandProcess, ProcessControl};
use crate::publisher::{PublisherLoop, PublisherStats};

/// Execute the `run` command: start the UI, publish until interrupted or
/// the tick limit is reached, then stop the UI.
pub async fn execute(
    mut config: SimConfig,
    all: bool,
    ticks: Option<u64>,
    no_ui: bool,
) -> Result<PublisherStats> {
    if all {
        config.scenario = Scenario::All;
    }
    if ticks.is_some() {
        config.max_ticks = ticks;
    }

    let registry = EventRegistry::builtin();
    let schedule = config.schedule(&registry);
    let bus = config.connect_bus().await?;

    let mut publisher = PublisherLoop::new(bus, registry, schedule, config.publisher_config())
        .with_context(config.alert_context());
    if let Some(replay) = config.replay() {
        publisher = publisher.with_replay(Box::new(replay));
    }

    let mut ui = match &config.ui {
        Some(ui) if !no_ui => Some(CommandProcess::new(ui.clone())),
        _ => None,
    };
    if let Some(ui) = ui.as_mut() {
        ui.start().await?;
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                // Keep the sender alive so the loop is not stopped
                std::future::pending::<()>().await;
            }
        }
    });

    let stats = publisher.run(stop_rx).await;
    signal.abort();

    if let Some(ui) = ui.as_mut() {
        if let Err(e) = ui.stop().await {
            tracing::warn!(name = ui.name(), error = %e, "Failed to stop UI process");
        }
    }

    println!(
        "Published {} tick(s), {} message(s), {} error(s), {} overrun(s)",
        stats.ticks, stats.published, stats.publish_errors, stats.overruns
    );
    Ok(stats)
}
