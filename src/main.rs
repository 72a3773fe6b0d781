mod runner;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use component_manager::model::component::ComponentType;
use component_manager::model::config::{self, AppConfig};

#[derive(Debug, Parser)]
#[command(name = "component-manager", version, about)]
struct Cli {
    /// Use this config file instead of the one in the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the recommended components for the configured core version.
    Install {
        /// Select every module in the feed.
        #[arg(long)]
        all_modules: bool,
        /// Also select this module (repeatable).
        #[arg(long = "module", value_name = "FOLDER")]
        modules: Vec<String>,
        /// Also select this theme (repeatable).
        #[arg(long = "theme", value_name = "FOLDER")]
        themes: Vec<String>,
        /// Leave the API out even if the feed recommends it.
        #[arg(long)]
        no_api: bool,
        /// Print every log line the server returned.
        #[arg(long)]
        verbose: bool,
    },
    /// Compare installed components with what the feed offers.
    Manage,
    /// Print the changelog of one component.
    Info {
        /// core, api, module or theme
        kind: ComponentType,
        folder: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging to file (never stdout)
    let log_dir = config::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "component-manager.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(config.logging.filter.as_str())
        .init();

    tracing::info!("component-manager starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(runner::run(cli.command, config));

    if let Err(e) = &result {
        tracing::error!("component-manager failed: {e:?}");
    }
    result
}
