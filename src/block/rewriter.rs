//! Block Rewriter
//!
//! Renders every query block of a document and splices the results back in
//! place, replacing whatever output a previous run produced.

use anyhow::{Context, Result};
use futures::future::try_join_all;

use super::scanner::{scan, CLOSE_FENCE, OPEN_FENCE, OUTPUT_END, OUTPUT_START};
use crate::render::{QueryRenderer, RenderRequest};

/// Format a query block followed by its rendered output section
pub fn render_section(query: &str, rendered: &str) -> String {
    format!("{OPEN_FENCE}\n{query}\n{CLOSE_FENCE}\n{OUTPUT_START}\n\n{rendered}\n{OUTPUT_END}")
}

/// Rewrite `text` so that every query block carries freshly rendered output.
///
/// All blocks are rendered concurrently; the results are spliced back in
/// document order. If any render fails, the whole rewrite fails and no
/// partially rewritten text is produced. Text without blocks comes back
/// unchanged.
pub async fn rewrite(
    text: &str,
    renderer: &dyn QueryRenderer,
    origin: Option<&str>,
) -> Result<String> {
    let blocks = scan(text);
    if blocks.is_empty() {
        return Ok(text.to_string());
    }

    let total = blocks.len();
    let renders = blocks.iter().enumerate().map(|(index, block)| {
        let request = RenderRequest {
            query: block.query,
            context: text,
            origin,
        };
        async move {
            renderer
                .render(&request)
                .await
                .with_context(|| format!("Failed to render query block {} of {}", index + 1, total))
        }
    });
    let rendered = try_join_all(renders).await?;

    let extra: usize = rendered.iter().map(String::len).sum();
    let mut output = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for (block, result) in blocks.iter().zip(&rendered) {
        output.push_str(&text[cursor..block.span.start]);
        output.push_str(&render_section(block.query, result));
        cursor = block.span.end;
    }
    output.push_str(&text[cursor..]);

    Ok(output)
}
