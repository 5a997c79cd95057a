use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::lsp::backend::Backend;
use crate::Config;

/// Start the language server on stdio
pub async fn serve(config: Config) -> Result<()> {
    log::info!(
        "Starting language server (renderer: {}, sweep every {:?})",
        config.renderer.command,
        config.sweep_interval
    );

    let (service, socket) =
        LspService::build(move |client| Backend::new(client, config)).finish();

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
