//! Configuration management for dataview-inline.
//!
//! Handles:
//! - Command-line argument parsing
//! - The optional TOML settings file
//! - Renderer, sweep and watcher settings

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_SETTLE_MS: u64 = 100;
pub const DEFAULT_RENDERER: &str = "dataview-render";

/// Command-line arguments for dataview-inline
#[derive(Debug, Parser)]
#[command(name = "dataview-inline")]
#[command(about = "Renders inline dataview query blocks into markdown documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Settings file, defaults to <config dir>/dataview-inline/config.toml
    #[arg(long, help = "Path to a TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Query renderer program (name on PATH or explicit path)")]
    pub renderer: Option<String>,

    #[arg(
        long = "renderer-arg",
        allow_hyphen_values = true,
        help = "Argument passed to the renderer (repeatable)"
    )]
    pub renderer_args: Vec<String>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Milliseconds between sweeps of edited documents"
    )]
    pub interval_ms: Option<u64>,

    /// Log level for the add-in
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// What the process runs as
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run as a language server over stdio (default)
    Serve,
    /// Watch a directory of markdown documents and keep their blocks rendered
    Watch { dir: PathBuf },
    /// Rewrite the given documents once and exit
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Settings file contents, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub sweep_interval_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub extensions: Option<Vec<String>>,
    pub renderer: Option<RendererSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RendererSettings {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
}

impl SettingsFile {
    /// Parse a settings file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// The external program that renders query bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub command: String,
    pub args: Vec<String>,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,
    pub renderer: RendererConfig,
    /// Period of the sweep that drains edited documents
    pub sweep_interval: Duration,
    /// Quiet period before raw watcher events become one edit notification
    pub settle_window: Duration,
    /// File extensions the filesystem host treats as documents
    pub extensions: Vec<String>,
    pub log_level: String,
    /// Settings file that contributed to this configuration, if any
    pub settings_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Command::Serve,
            renderer: RendererConfig {
                command: DEFAULT_RENDERER.to_string(),
                args: Vec::new(),
            },
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            settle_window: Duration::from_millis(DEFAULT_SETTLE_MS),
            extensions: vec!["md".to_string()],
            log_level: "info".to_string(),
            settings_path: None,
        }
    }
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        // An explicit settings file must exist; the default one is optional
        let (settings, settings_path) = match &args.config {
            Some(path) => (SettingsFile::load(path)?, Some(path.clone())),
            None => match default_settings_path().filter(|p| p.is_file()) {
                Some(path) => (SettingsFile::load(&path)?, Some(path)),
                None => (SettingsFile::default(), None),
            },
        };

        Self::layered(args, settings, settings_path)
    }

    /// Apply the settings file over the defaults, then the CLI over both
    pub fn layered(
        args: Args,
        settings: SettingsFile,
        settings_path: Option<PathBuf>,
    ) -> Result<Self> {
        let defaults = Config::default();

        let file_renderer = settings.renderer.unwrap_or_default();
        let renderer = match args.renderer {
            Some(command) => RendererConfig {
                command,
                args: args.renderer_args,
            },
            None => RendererConfig {
                command: file_renderer.command.unwrap_or(defaults.renderer.command),
                args: if args.renderer_args.is_empty() {
                    file_renderer.args.unwrap_or_default()
                } else {
                    args.renderer_args
                },
            },
        };

        let sweep_interval = args
            .interval_ms
            .or(settings.sweep_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.sweep_interval);
        if sweep_interval.is_zero() {
            bail!("sweep_interval_ms must be at least 1");
        }

        let settle_window = settings
            .settle_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_window);

        let extensions = settings
            .extensions
            .map(|exts| {
                exts.into_iter()
                    .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                    .collect()
            })
            .unwrap_or(defaults.extensions);

        Ok(Config {
            command: args.command.unwrap_or(Command::Serve),
            renderer,
            sweep_interval,
            settle_window,
            extensions,
            log_level: args.log_level,
            settings_path,
        })
    }

    /// Whether the filesystem host should treat this path as a document
    pub fn tracks(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|tracked| tracked.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// `<config dir>/dataview-inline/config.toml`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dataview-inline").join("config.toml"))
}
