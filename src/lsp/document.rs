//! Editor Documents
//!
//! The editor owns the documents: their text arrives through document sync
//! and goes back through `workspace/applyEdit`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

use crate::storage::Storage;

/// State for each open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub content: String,
    pub version: i32,
}

/// Open documents plus the one the user touched last
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Mutex<HashMap<Url, DocumentState>>,
    active: Mutex<Option<Url>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document's full text; it becomes the active document
    pub async fn update(&self, uri: Url, content: String, version: i32) {
        self.documents
            .lock()
            .await
            .insert(uri.clone(), DocumentState { content, version });
        *self.active.lock().await = Some(uri);
    }

    pub async fn close(&self, uri: &Url) {
        self.documents.lock().await.remove(uri);
        let mut active = self.active.lock().await;
        if active.as_ref() == Some(uri) {
            *active = None;
        }
    }

    pub async fn get(&self, uri: &Url) -> Option<DocumentState> {
        self.documents.lock().await.get(uri).cloned()
    }

    /// The document currently open in the editing surface, if any
    pub async fn active(&self) -> Option<Url> {
        self.active.lock().await.clone()
    }
}

/// Range covering the whole of `text`, in UTF-16 positions
pub fn full_range(text: &str) -> Range {
    let line = text.matches('\n').count() as u32;
    let last_line = text.rsplit('\n').next().unwrap_or("");
    Range::new(
        Position::new(0, 0),
        Position::new(line, last_line.encode_utf16().count() as u32),
    )
}

/// The document as a read saw it, so the write can target that version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorRevision {
    pub version: i32,
    /// Whole-document range of the text that was read
    pub range: Range,
}

/// Storage over the editor's open documents.
///
/// Writes are versioned against the text that was read, so the editor
/// rejects them if the user changed the document in between.
pub struct EditorStorage {
    client: Client,
    documents: Arc<DocumentStore>,
}

impl EditorStorage {
    pub fn new(client: Client, documents: Arc<DocumentStore>) -> Self {
        Self { client, documents }
    }
}

/// Edit replacing a whole document at a known version
pub fn replace_document_edit(uri: &Url, version: i32, range: Range, text: &str) -> WorkspaceEdit {
    WorkspaceEdit {
        document_changes: Some(DocumentChanges::Edits(vec![TextDocumentEdit {
            text_document: OptionalVersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version: Some(version),
            },
            edits: vec![OneOf::Left(TextEdit {
                range,
                new_text: text.to_string(),
            })],
        }])),
        ..Default::default()
    }
}

#[async_trait]
impl Storage for EditorStorage {
    type Id = Url;
    type Revision = EditorRevision;

    async fn read(&self, uri: &Url) -> Result<(String, EditorRevision)> {
        let document = self
            .documents
            .get(uri)
            .await
            .with_context(|| format!("Document is not open in the editor: {}", uri))?;

        let revision = EditorRevision {
            version: document.version,
            range: full_range(&document.content),
        };
        Ok((document.content, revision))
    }

    async fn write(&self, uri: &Url, revision: &EditorRevision, text: &str) -> Result<()> {
        let response = self
            .client
            .apply_edit(replace_document_edit(
                uri,
                revision.version,
                revision.range,
                text,
            ))
            .await
            .with_context(|| format!("applyEdit request failed for {}", uri))?;

        if !response.applied {
            bail!(
                "Editor rejected the edit for {}: {}",
                uri,
                response
                    .failure_reason
                    .unwrap_or_else(|| "no reason given".to_string())
            );
        }

        Ok(())
    }

    fn origin(&self, uri: &Url) -> String {
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(path: &str) -> Url {
        Url::parse(&format!("file:///vault/{}", path)).expect("valid uri")
    }

    #[test]
    fn test_full_range() {
        assert_eq!(full_range(""), Range::new(Position::new(0, 0), Position::new(0, 0)));
        assert_eq!(
            full_range("a\nbc"),
            Range::new(Position::new(0, 0), Position::new(1, 2))
        );
        assert_eq!(
            full_range("line\n"),
            Range::new(Position::new(0, 0), Position::new(1, 0))
        );
        // UTF-16 code units, not bytes
        assert_eq!(
            full_range("é😀"),
            Range::new(Position::new(0, 0), Position::new(0, 3))
        );
    }

    #[tokio::test]
    async fn test_store_tracks_active_document() {
        let store = DocumentStore::new();
        assert_eq!(store.active().await, None);

        store.update(uri("a.md"), "a".to_string(), 1).await;
        store.update(uri("b.md"), "b".to_string(), 1).await;
        assert_eq!(store.active().await, Some(uri("b.md")));

        store.update(uri("a.md"), "a2".to_string(), 2).await;
        assert_eq!(store.active().await, Some(uri("a.md")));
        assert_eq!(
            store.get(&uri("a.md")).await,
            Some(DocumentState {
                content: "a2".to_string(),
                version: 2
            })
        );

        store.close(&uri("a.md")).await;
        assert_eq!(store.active().await, None);
        assert_eq!(store.get(&uri("a.md")).await, None);
        assert!(store.get(&uri("b.md")).await.is_some());
    }

    #[test]
    fn test_replace_document_edit_is_versioned() {
        let edit = replace_document_edit(&uri("a.md"), 7, full_range("old"), "new");

        let Some(DocumentChanges::Edits(edits)) = edit.document_changes else {
            panic!("Expected document edits");
        };
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].text_document.version, Some(7));
        match &edits[0].edits[0] {
            OneOf::Left(text_edit) => assert_eq!(text_edit.new_text, "new"),
            OneOf::Right(_) => panic!("Expected a plain text edit"),
        }
    }
}
