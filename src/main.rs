mod cli;
mod config;
mod cook_time;
mod countdown;
mod error;
mod events;
mod food;
mod microwave;
mod repl;
mod state_machine;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use config::MicrowaveConfig;
use microwave::Microwave;
use tracing_subscriber::EnvFilter;
use ui::Console;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MicrowaveConfig::load(cli.config.as_deref())?;
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_ms = tick_ms;
        config.validate()?;
    }

    init_tracing(&config, cli.verbose);

    let microwave = Microwave::new(config.cook_settings());
    let console = Console::new(cli.verbose);

    match cli.subcommand() {
        Command::Repl => repl::run(&microwave, &console).await?,
        Command::Demo => {
            repl::demo(&microwave, &console).await?;
        }
    }
    Ok(())
}

fn init_tracing(config: &MicrowaveConfig, verbose: bool) {
    let fallback = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
