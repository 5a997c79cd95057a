//! Shared fakes for the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use dataview_inline::{QueryRenderer, RenderRequest, Storage};

type WriteHook = Box<dyn Fn(&String) + Send + Sync>;

/// In-memory documents keyed by name. Each document carries a revision
/// and writes based on an older revision are rejected, like an editor does.
#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, (String, u64)>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    on_write: Mutex<Option<WriteHook>>,
}

impl MemoryStorage {
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        let storage = Self::default();
        for (name, text) in documents {
            storage.insert(name, text);
        }
        storage
    }

    /// Store `text` as a new revision of `name`
    pub fn insert(&self, name: &str, text: &str) {
        let mut documents = self.documents.lock().unwrap();
        let revision = documents.get(name).map_or(0, |(_, revision)| revision + 1);
        documents.insert(name.to_string(), (text.to_string(), revision));
    }

    pub fn text(&self, name: &str) -> String {
        self.documents.lock().unwrap()[name].0.clone()
    }

    /// Run `hook` at the start of every write, before it can fail
    pub fn on_write(&self, hook: impl Fn(&String) + Send + Sync + 'static) {
        *self.on_write.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Id = String;
    type Revision = u64;

    async fn read(&self, id: &String) -> Result<(String, u64)> {
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .with_context(|| format!("no such document: {}", id))
    }

    async fn write(&self, id: &String, revision: &u64, text: &str) -> Result<()> {
        if let Some(hook) = self.on_write.lock().unwrap().as_ref() {
            hook(id);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        let current = self.documents.lock().unwrap().get(id).map(|(_, r)| *r);
        if current != Some(*revision) {
            bail!("stale write to {}: read revision {}, now {:?}", id, revision, current);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(id, text);
        Ok(())
    }

    fn origin(&self, id: &String) -> String {
        id.clone()
    }
}

/// Deterministic renderer: `result of <query>`, failing for queries containing FAIL
#[derive(Default)]
pub struct EchoRenderer {
    calls: AtomicUsize,
}

impl EchoRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryRenderer for EchoRenderer {
    async fn render(&self, request: &RenderRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.query.contains("FAIL") {
            bail!("query failed: {}", request.query);
        }
        Ok(format!("result of {}", request.query))
    }
}

/// Sleeps for the number of milliseconds given after `sleep:` in the query,
/// recording the order in which renders finish
#[derive(Default)]
pub struct SlowRenderer {
    pub finished: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryRenderer for SlowRenderer {
    async fn render(&self, request: &RenderRequest<'_>) -> Result<String> {
        let millis = request
            .query
            .split_once("sleep:")
            .and_then(|(_, rest)| rest.trim().parse::<u64>().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        self.finished.lock().unwrap().push(request.query.to_string());
        Ok(format!("result of {}", request.query))
    }
}

/// Blocks every render until the test opens the gate
pub struct GatedRenderer {
    pub started: Notify,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn open(&self, renders: usize) {
        self.gate.add_permits(renders);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryRenderer for GatedRenderer {
    async fn render(&self, request: &RenderRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        let _permit = self.gate.acquire().await?;
        Ok(format!("result of {}", request.query))
    }
}

/// A document containing one block with the given query
pub fn block(query: &str) -> String {
    format!("```inline dataview\n{}\n```\n", query)
}
