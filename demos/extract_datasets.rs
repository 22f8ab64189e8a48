//! Run the dataset extractor on a local markdown/text file, offline.
//!
//! ```text
//! cargo run --example extract_datasets -- ocr_output.md
//! ```

use docviz_client::extract;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: extract_datasets <file>");
        std::process::exit(2);
    };

    let text = tokio::fs::read_to_string(&path).await?;
    let datasets = extract(&text);

    if datasets.is_empty() {
        println!("no chartable data found in {}", path);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&datasets)?);
    Ok(())
}
