use clap::Parser;
use tracing_subscriber::EnvFilter;

use onroad_alerts::cli::{Cli, Commands};
use onroad_alerts::config::SimConfig;
use onroad_alerts::events::EventRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SimConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { all, ticks, no_ui } => {
            onroad_alerts::cli::run::execute(config, all, ticks, no_ui).await?;
        }
        Commands::List => {
            onroad_alerts::cli::list::execute(&EventRegistry::builtin(), &config.alert_context())?;
        }
        Commands::Show { event, event_type } => {
            onroad_alerts::cli::show::execute(
                &event,
                &event_type,
                &EventRegistry::builtin(),
                &config.alert_context(),
            )?;
        }
    }

    Ok(())
}
