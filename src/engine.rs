//! Processing Engine
//!
//! Ties storage, renderer and scheduler together: periodic sweeps over
//! edited documents, the manual scan, and the write-back that follows both.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::block::rewrite;
use crate::render::QueryRenderer;
use crate::scheduler::{ChangeScheduler, EditOutcome};
use crate::storage::Storage;

/// Result of processing one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The rendered text matched what was stored; nothing was written
    Unchanged,
    Rewritten,
}

/// One processed document from a sweep
pub type SweepResult<Id> = (Id, Result<Outcome>);

/// The add-in core for one session
pub struct Engine<S: Storage> {
    storage: Arc<S>,
    renderer: Arc<dyn QueryRenderer>,
    scheduler: Arc<ChangeScheduler<S::Id>>,
}

impl<S: Storage> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            renderer: self.renderer.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<S: Storage> Engine<S> {
    /// Start a session with empty pending and suppression sets
    pub fn new(storage: Arc<S>, renderer: Arc<dyn QueryRenderer>) -> Self {
        Self {
            storage,
            renderer,
            scheduler: Arc::new(ChangeScheduler::new()),
        }
    }

    pub fn scheduler(&self) -> &ChangeScheduler<S::Id> {
        &self.scheduler
    }

    /// Entry point for the host's edit notifications
    pub fn notify_edit(&self, id: &S::Id) -> EditOutcome {
        self.scheduler.on_edit(id)
    }

    /// Read, rewrite and write back one document.
    ///
    /// The echo suppression is recorded before the write is issued, because
    /// some hosts report the edit before the write call returns. It is
    /// withdrawn again if the write fails. If a real edit already consumed
    /// it by then, the document is queued again so that edit is not lost.
    pub async fn process(&self, id: &S::Id) -> Result<Outcome> {
        let (text, revision) = self.storage.read(id).await?;
        let origin = self.storage.origin(id);
        let rewritten = rewrite(&text, self.renderer.as_ref(), Some(origin.as_str())).await?;

        if rewritten == text {
            log::debug!("{} is up to date", origin);
            return Ok(Outcome::Unchanged);
        }

        self.scheduler.expect_echo(id.clone());
        if let Err(e) = self.storage.write(id, &revision, &rewritten).await {
            if !self.scheduler.cancel_echo(id) {
                self.scheduler.requeue(id.clone());
            }
            return Err(e);
        }

        log::info!("Rendered inline queries in {}", origin);
        Ok(Outcome::Rewritten)
    }

    /// Manual trigger: process `id` now, bypassing the queue
    pub async fn scan(&self, id: &S::Id) -> Result<Outcome> {
        log::debug!("Manual scan of {}", self.storage.origin(id));
        self.process(id).await
    }

    /// Drain the queue and process each queued document in its own task.
    ///
    /// The queue is emptied before this returns, so edits made while the
    /// tasks run are picked up by the next sweep. Failures are logged and
    /// otherwise left for the document's next edit to retry.
    pub fn sweep(&self) -> JoinSet<SweepResult<S::Id>> {
        let mut tasks = JoinSet::new();

        for id in self.scheduler.take_pending() {
            let engine = self.clone();
            tasks.spawn(async move {
                let result = engine.process(&id).await;
                if let Err(e) = &result {
                    log::warn!("Skipping {}: {:#}", engine.storage.origin(&id), e);
                }
                (id, result)
            });
        }

        tasks
    }

    /// Sweep every `period` until the task is aborted
    pub async fn run_sweeps(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let mut tasks = self.sweep();
            if !tasks.is_empty() {
                log::debug!("Sweeping {} document(s)", tasks.len());
            }
            tasks.detach_all();
        }
    }

    /// End the session, forgetting every pending edit and suppression
    pub fn deactivate(&self) {
        self.scheduler.clear();
    }
}
