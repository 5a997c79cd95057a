use serde_json::{json, Value};
use tower_lsp::jsonrpc::{Error as LspError, Result as LspResult};
use tower_lsp::lsp_types::*;

use crate::engine::Outcome;
use crate::lsp::backend::Backend;

/// Command id of the on-demand "Scan" of the active document
pub const SCAN_COMMAND: &str = "dataview-inline.scan";

/// Trait for handling document changes
#[tower_lsp::async_trait]
pub trait HandleDocumentSync {
    async fn handle_did_change(&self, params: DidChangeTextDocumentParams);
}

/// Trait for handling workspace commands
#[tower_lsp::async_trait]
pub trait HandleExecuteCommand {
    async fn handle_execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>>;
}

#[tower_lsp::async_trait]
impl HandleDocumentSync for Backend {
    async fn handle_did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change carries the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        self.documents
            .update(uri.clone(), change.text, params.text_document.version)
            .await;

        if let Some(engine) = &self.engine {
            engine.notify_edit(&uri);
        }
    }
}

#[tower_lsp::async_trait]
impl HandleExecuteCommand for Backend {
    async fn handle_execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        if params.command != SCAN_COMMAND {
            return Err(LspError::invalid_params(format!(
                "Unknown command: {}",
                params.command
            )));
        }

        let Some(engine) = &self.engine else {
            self.client
                .log_message(
                    MessageType::WARNING,
                    "dataview-inline is disabled because the query renderer is unavailable",
                )
                .await;
            return Ok(None);
        };

        let target = match scan_target(&params.arguments) {
            Some(uri) => Some(uri),
            None => self.documents.active().await,
        };
        let Some(uri) = target else {
            self.client
                .show_message(MessageType::WARNING, "No active document to scan")
                .await;
            return Ok(None);
        };

        match engine.scan(&uri).await {
            Ok(outcome) => Ok(Some(json!({
                "uri": uri.as_str(),
                "rewritten": outcome == Outcome::Rewritten,
            }))),
            Err(e) => {
                log::warn!("Scan of {} failed: {:#}", uri, e);
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("Scan of {} failed: {:#}", uri, e),
                    )
                    .await;
                Ok(None)
            }
        }
    }
}

/// Document to scan: a URI string or `{ "uri": ... }` as the first argument
pub fn scan_target(arguments: &[Value]) -> Option<Url> {
    let raw = match arguments.first()? {
        Value::String(uri) => uri.as_str(),
        Value::Object(map) => map.get("uri")?.as_str()?,
        _ => return None,
    };
    Url::parse(raw).ok()
}
