//! guidepost - on-page guidance co-pilot
//!
//! Entry point for the guidepost CLI.

mod browser;
mod cli;
mod cmd_assist;
mod cmd_config;
mod cmd_guide;

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use guidepost_config::{ConfigLoader, LoggingConfig};

use cli::{Cli, Commands};
use cmd_guide::GuideArgs;

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = PathBuf::from(ConfigLoader::expand_path(&logging.directory));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the background writer.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let (json_file, text_file) = if logging.json {
        (
            Some(fmt::layer().json().with_writer(non_blocking)),
            None,
        )
    } else {
        (
            None,
            Some(fmt::layer().with_writer(non_blocking).with_ansi(false)),
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(json_file)
        .with(text_file)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.browser.cdp_endpoint = endpoint;
    }

    init_tracing(&config.logging)?;
    debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Guide {
            identifier,
            label,
            auto_click,
            json,
        } => {
            let args = GuideArgs {
                identifier,
                label,
                auto_click,
                json,
            };
            cmd_guide::handle_guide_command(config, args).await
        }
        Commands::Assist { query } => cmd_assist::handle_assist_command(config, query).await,
        Commands::Config { action } => cmd_config::handle_config_command(&config, action),
    }
}
