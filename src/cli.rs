//! Command-line entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::{Command, Config};
use crate::engine::{Engine, Outcome};
use crate::render::CommandRenderer;
use crate::storage::FsStorage;
use crate::{lsp, watch};

/// Parse arguments, set up logging and run the selected host
pub async fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Some(path) = &config.settings_path {
        log::debug!("Loaded settings from {}", path.display());
    }

    match config.command.clone() {
        Command::Serve => lsp::server::serve(config).await,
        Command::Watch { dir } => watch::run(&config, &dir).await,
        Command::Scan { files } => scan_files(&config, &files).await,
    }
}

/// Manual trigger over explicit files. Every file is attempted.
pub async fn scan_files(config: &Config, files: &[PathBuf]) -> Result<()> {
    let renderer = CommandRenderer::locate(&config.renderer)?;
    let engine = Engine::new(Arc::new(FsStorage::new()), Arc::new(renderer));

    let mut failures = 0;
    for file in files {
        match engine.scan(file).await {
            Ok(Outcome::Rewritten) => log::info!("Updated {}", file.display()),
            Ok(Outcome::Unchanged) => log::info!("{} is up to date", file.display()),
            Err(e) => {
                failures += 1;
                log::error!("{}: {:#}", file.display(), e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} documents could not be rendered", failures, files.len());
    }
    Ok(())
}
