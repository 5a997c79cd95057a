//! Document Storage
//!
//! Where document text comes from and goes back to. The filesystem host
//! uses [`FsStorage`]; the editor host stores documents in the editor
//! (see `lsp::document`).

pub mod fs;

use std::fmt::Debug;
use std::hash::Hash;

use anyhow::Result;
use async_trait::async_trait;

pub use fs::FsStorage;

/// Read and write access to documents identified by `Id`
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    /// What a read saw, handed back to the write that follows it
    type Revision: Send + Sync + 'static;

    async fn read(&self, id: &Self::Id) -> Result<(String, Self::Revision)>;

    /// Replace the document's text as of `revision`. The host reports this
    /// as an edit.
    async fn write(&self, id: &Self::Id, revision: &Self::Revision, text: &str) -> Result<()>;

    /// Human-readable identity, passed to the renderer and used in logs
    fn origin(&self, id: &Self::Id) -> String;
}
