//! Query Rendering
//!
//! The add-in has no query language of its own; each query body is handed to
//! a renderer together with the document it came from.

pub mod command;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use command::CommandRenderer;

/// A single query to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderRequest<'a> {
    /// Query source text, opaque to this crate
    pub query: &'a str,
    /// Full text of the document containing the query
    pub context: &'a str,
    /// Identity of that document (path or URI), when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<&'a str>,
}

/// Evaluates a query body against its document and returns rendered markdown
#[async_trait]
pub trait QueryRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest<'_>) -> Result<String>;
}
