use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::engine::Engine;
use crate::lsp::document::{DocumentStore, EditorStorage};
use crate::lsp::handlers::{HandleDocumentSync, HandleExecuteCommand, SCAN_COMMAND};
use crate::render::{CommandRenderer, QueryRenderer};
use crate::Config;

/// The language server backend: the add-in, hosted by the editor
pub struct Backend {
    pub client: Client,
    pub documents: Arc<DocumentStore>,
    /// `None` when the renderer could not be found at startup
    pub engine: Option<Engine<EditorStorage>>,
    pub startup_error: Option<String>,
    pub sweeper: Mutex<Option<JoinHandle<()>>>,
    pub config: Config,
}

impl Backend {
    pub fn new(client: Client, config: Config) -> Self {
        match CommandRenderer::locate(&config.renderer) {
            Ok(renderer) => Self::with_renderer(client, config, Arc::new(renderer)),
            Err(e) => Self {
                client,
                documents: Arc::new(DocumentStore::new()),
                engine: None,
                startup_error: Some(format!("{:#}", e)),
                sweeper: Mutex::new(None),
                config,
            },
        }
    }

    pub fn with_renderer(client: Client, config: Config, renderer: Arc<dyn QueryRenderer>) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let storage = EditorStorage::new(client.clone(), documents.clone());

        Self {
            client,
            documents,
            engine: Some(Engine::new(Arc::new(storage), renderer)),
            startup_error: None,
            sweeper: Mutex::new(None),
            config,
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(
        &self,
        _: InitializeParams,
    ) -> tower_lsp::jsonrpc::Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![SCAN_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let Some(engine) = &self.engine else {
            let message = self
                .startup_error
                .clone()
                .unwrap_or_else(|| "The query renderer is unavailable".to_string());
            log::error!("{}", message);
            // Shown once; the add-in stays disabled for this session
            self.client.show_message(MessageType::ERROR, message).await;
            return;
        };

        let handle = tokio::spawn(engine.clone().run_sweeps(self.config.sweep_interval));
        *self.sweeper.lock().await = Some(handle);

        self.client
            .log_message(MessageType::INFO, "dataview-inline initialized")
            .await;
    }

    async fn shutdown(&self) -> tower_lsp::jsonrpc::Result<()> {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
        }
        if let Some(engine) = &self.engine {
            engine.deactivate();
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.documents
            .update(document.uri, document.text, document.version)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.handle_did_change(params).await
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri).await;
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> tower_lsp::jsonrpc::Result<Option<serde_json::Value>> {
        self.handle_execute_command(params).await
    }
}
