//! Watcher event coalescing
//!
//! One write can surface as several raw events on the same path (truncate,
//! data, close). Events for a path are merged until it has been quiet for
//! the settle window, then released as a single edit notification.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct EventCoalescer {
    window: Duration,
    deadlines: HashMap<PathBuf, Instant>,
}

impl EventCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Record a raw event, pushing the path's release time back
    pub fn observe(&mut self, path: PathBuf, now: Instant) {
        self.deadlines.insert(path, now + self.window);
    }

    /// Earliest time at which some path becomes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every path that has been quiet for the window
    pub fn drain_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut due: Vec<PathBuf> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.deadlines.remove(path);
        }
        due.sort();
        due
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
