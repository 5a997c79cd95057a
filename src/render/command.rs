//! External Renderer Process
//!
//! Runs a renderer program once per query. The request goes to the
//! program's stdin as JSON and the rendered markdown is read from stdout.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{QueryRenderer, RenderRequest};
use crate::config::RendererConfig;

/// Query renderer backed by an external program
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Resolve the configured renderer program.
    ///
    /// This is the startup check: without a renderer the add-in cannot run.
    pub fn locate(config: &RendererConfig) -> Result<Self> {
        let program = which::which(&config.command).with_context(|| {
            format!(
                "The query renderer '{}' was not found. Install it or pass --renderer, then restart dataview-inline",
                config.command
            )
        })?;

        Ok(Self {
            program,
            args: config.args.clone(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl QueryRenderer for CommandRenderer {
    async fn render(&self, request: &RenderRequest<'_>) -> Result<String> {
        let payload = serde_json::to_vec(request).context("Failed to encode render request")?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn renderer {}", self.program.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .context("Failed to capture renderer stdin")?;

        // Feed stdin while collecting output so a chatty renderer can't stall on a full pipe
        let feed = async move {
            let written = stdin.write_all(&payload).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.context("Failed to wait for renderer")?;

        if let Err(e) = written {
            // A renderer may answer without reading the whole request
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e).context("Failed to send query to renderer");
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Renderer {} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            );
        }

        let rendered =
            String::from_utf8(output.stdout).context("Renderer output is not valid UTF-8")?;
        Ok(rendered.trim_end_matches(['\n', '\r']).to_string())
    }
}
