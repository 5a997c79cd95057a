//! Filesystem Host
//!
//! Watches a directory of markdown documents. File modifications become
//! edit notifications, and a periodic sweep re-renders the edited documents.

pub mod coalescer;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;

pub use coalescer::EventCoalescer;

use crate::config::Config;
use crate::engine::Engine;
use crate::render::CommandRenderer;
use crate::storage::FsStorage;

/// Events from the file watcher
#[derive(Debug)]
pub enum WatcherEvent {
    DocumentChanged(PathBuf),
    WatcherError(notify::Error),
}

/// Run the filesystem host until Ctrl-C
pub async fn run(config: &Config, root: &Path) -> Result<()> {
    let renderer = match CommandRenderer::locate(&config.renderer) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("{:#}", e);
            return Err(e);
        }
    };
    log::info!("Using query renderer {}", renderer.program().display());

    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve watch directory: {}", root.display()))?;
    let engine = Engine::new(Arc::new(FsStorage::with_root(&root)), Arc::new(renderer));

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = start_watching(&root, config, tx)?;

    let forwarder = tokio::spawn(forward_edits(rx, engine.clone(), config.settle_window));
    let sweeper = tokio::spawn(engine.clone().run_sweeps(config.sweep_interval));
    log::info!("Watching {} for inline dataview blocks", root.display());

    let stopped = tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C");

    sweeper.abort();
    forwarder.abort();
    engine.deactivate();
    log::info!("Stopped watching {}", root.display());

    stopped
}

/// Watch `root` recursively, sending tracked document changes to `tx`
pub fn start_watching(
    root: &Path,
    config: &Config,
    tx: mpsc::UnboundedSender<WatcherEvent>,
) -> Result<RecommendedWatcher> {
    let filter = config.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if is_content_change(&event.kind) {
                    for path in event.paths {
                        if filter.tracks(&path) {
                            let _ = tx.send(WatcherEvent::DocumentChanged(path));
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(WatcherEvent::WatcherError(e));
            }
        },
        NotifyConfig::default().with_poll_interval(Duration::from_secs(1)),
    )?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    Ok(watcher)
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Coalesce raw watcher events and hand them to the scheduler as edits
pub async fn forward_edits(
    mut rx: mpsc::UnboundedReceiver<WatcherEvent>,
    engine: Engine<FsStorage>,
    settle_window: Duration,
) {
    let mut coalescer = EventCoalescer::new(settle_window);

    loop {
        let deadline = coalescer.next_deadline();
        tokio::select! {
            event = rx.recv() => match event {
                Some(WatcherEvent::DocumentChanged(path)) => coalescer.observe(path, Instant::now()),
                Some(WatcherEvent::WatcherError(e)) => log::warn!("File watcher error: {}", e),
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                for path in coalescer.drain_due(Instant::now()) {
                    engine.notify_edit(&path);
                }
            }
        }
    }
}
