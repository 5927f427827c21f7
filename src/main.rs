use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cellwatch::config::{Config, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "cellwatch",
    version,
    about = "Watches grid cells and reports their state to an HTTP service",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration and print the resolved endpoints
    Validate {
        /// World snapshot to check watch entries against
        #[arg(short, long)]
        world: Option<PathBuf>,
    },

    /// Send one block info report, like the in-game command
    Report {
        /// World snapshot (JSON)
        #[arg(short, long)]
        world: PathBuf,

        /// <x> <y> <z> [extraData|@selector]
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Start the monitor against a world snapshot and replay change signals
    Replay {
        /// World snapshot (JSON)
        #[arg(short, long)]
        world: PathBuf,

        /// JSON-lines event log, or '-' for stdin
        #[arg(short, long)]
        events: String,

        /// Wall-clock milliseconds per tick
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        /// Print Prometheus metrics when done
        #[arg(long, default_value = "false")]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;

    tracing::info!(config = %cli.config.display(), "cellwatch starting");

    match cli.command {
        Commands::Validate { world } => {
            commands::validate(&config, world.as_deref())?;
        }

        Commands::Report { world, args } => {
            tracing::info!(world = %world.display(), args = ?args, "Starting report command");
            commands::report(config, &world, args).await?;
        }

        Commands::Replay {
            world,
            events,
            tick_ms,
            metrics,
        } => {
            tracing::info!(
                world = %world.display(),
                events = %events,
                tick_ms = %tick_ms,
                "Starting replay command"
            );
            commands::replay(
                config,
                commands::ReplayParams {
                    world,
                    events,
                    tick_ms,
                    show_metrics: metrics,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, format_override: Option<&str>, verbose: bool) -> Result<()> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => tracing_subscriber::EnvFilter::new("cellwatch=debug,info"),
        Err(_) => tracing_subscriber::EnvFilter::try_new(format!("cellwatch={},warn", logging.level))
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    match format_override.unwrap_or(&logging.format) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
