pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod render;
pub mod repl;
pub mod session;
pub mod state;
pub mod view;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use state::AppState;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_tracing()?;

    let config = cli.apply(AppConfig::load(cli.config.as_deref())?);
    tracing::info!(
        provider = config.provider.as_str(),
        model = config.model(),
        "starting"
    );
    let state = AppState::new(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(repl::run(state))
}
