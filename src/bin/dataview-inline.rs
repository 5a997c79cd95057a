use anyhow::Result;
use dataview_inline::cli::run;

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}
