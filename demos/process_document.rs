//! Submit a document, follow it to completion, print the extracted series
//! and save both artifacts.
//!
//! ```text
//! DOCVIZ_URL=http://localhost:8708 cargo run --example process_document -- report.pdf "分析季度销售"
//! ```
//!
//! Ctrl+C cancels the run.

use std::sync::Arc;

use docviz_client::{Config, FileSystemSink, Pipeline, SubmitOptions, Task};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: process_document <file> [query]");
        std::process::exit(2);
    };

    let base_url =
        std::env::var("DOCVIZ_URL").unwrap_or_else(|_| Config::default().base_url.clone());
    let config = Config::with_base_url(base_url);
    let options = args.next().map(|query| SubmitOptions {
        query,
        ..config.default_submit_options()
    });
    let sink = Arc::new(FileSystemSink::from_config(&config.download));

    let pipeline = Arc::new(Pipeline::new(config)?);
    let health = pipeline.transport().health().await?;
    tracing::info!(status = %health.status, active_tasks = ?health.active_tasks, "service is up");

    let watcher = pipeline.clone();
    tokio::spawn(async move { watcher.cancel_on_shutdown_signal().await });

    let outcome = pipeline
        .process_path(&path, options, |task: &Task| {
            println!(
                "[{:>3}%] {:<15} {}",
                task.progress, task.status, task.message
            );
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("failed ({}): {}", e.error_code(), e);
            std::process::exit(1);
        }
    };

    println!("\n{}", outcome.results.visualization.title);
    println!("{}", outcome.results.visualization.summary_text);

    match &outcome.datasets {
        None => println!("no OCR text to extract from"),
        Some(datasets) if datasets.is_empty() => println!("no chartable data found"),
        Some(datasets) => {
            for dataset in datasets.datasets() {
                println!("{} ({} points)", dataset.label, dataset.len());
                for point in &dataset.points {
                    println!("  {:<12} {}", point.category, point.value);
                }
            }
        }
    }

    let saved = pipeline
        .downloads(sink)
        .download_all(&outcome.results.artifacts)
        .await?;
    for artifact in saved {
        if let Some(path) = artifact.path {
            println!("saved {} ({} bytes)", path.display(), artifact.size_bytes);
        }
    }

    Ok(())
}
