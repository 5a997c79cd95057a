//! Dataview Inline
//!
//! Keeps rendered query output next to inline dataview blocks in markdown
//! documents, and keeps it current as the documents change.
//!
//! This library provides:
//! - Block scanning and rewriting
//! - Change scheduling with self-write suppression
//! - Filesystem and editor (LSP) hosts
//! - Configuration management

pub mod block;
pub mod cli;
pub mod config;
pub mod engine;
pub mod lsp;
pub mod render;
pub mod scheduler;
pub mod storage;
pub mod watch;

// Re-exports for clean public API
pub use block::{rewrite, scan, QueryBlock};
pub use config::Config;
pub use engine::{Engine, Outcome};
pub use render::{CommandRenderer, QueryRenderer, RenderRequest};
pub use scheduler::{ChangeScheduler, DocState, EditOutcome};
pub use storage::{FsStorage, Storage};
