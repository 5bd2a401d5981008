//! batchpress - run one image batch from the command line.
//!
//! Reads a CSV batch file, dispatches it through the in-process pipeline, and
//! polls job status until it settles. The in-memory record store lives only
//! for the duration of the run; derived images and the output table land in
//! the artifact directory.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::sleep;
use tracing::info;

use batchpress_core::app::{
    job_status, Aggregator, Dispatcher, Notifier, OutputAssembler, PipelineConfig,
};
use batchpress_core::app::tabular::read_rows;
use batchpress_core::ports::{
    HttpCallbackSink, HttpFetcher, JpegCompressor, LocalArtifactStore, SystemClock, UlidGenerator,
};
use batchpress_core::store::InMemoryStore;

#[derive(Parser, Debug)]
#[command(name = "batchpress", about = "Fetch, compress, and tabulate a batch of product images")]
struct Args {
    /// CSV batch file (columns: "S. No.", "Product Name", "Input Image Urls").
    batch_file: PathBuf,

    /// Endpoint to POST {jobId, status, outputRef} to on completion.
    #[arg(long)]
    callback_url: Option<String>,

    /// Directory for derived images and the output table.
    #[arg(long, default_value = "processed")]
    artifact_dir: PathBuf,

    /// Cap on concurrently running fetch-transform units.
    #[arg(long, default_value_t = 16)]
    concurrency: usize,

    /// Per-fetch timeout in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// JPEG quality for the compressor (1-100).
    #[arg(long, default_value_t = 50)]
    quality: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        max_concurrent_units: args.concurrency.max(1),
        jpeg_quality: args.quality.clamp(1, 100),
        ..PipelineConfig::default()
    };

    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(SystemClock);
    let ids = Arc::new(UlidGenerator::new(SystemClock));

    let artifacts = Arc::new(LocalArtifactStore::new(&args.artifact_dir));
    artifacts
        .ensure_root()
        .await
        .with_context(|| format!("creating artifact dir {}", args.artifact_dir.display()))?;

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
    let transformer = Arc::new(JpegCompressor::new(config.jpeg_quality));

    let aggregator = Arc::new(Aggregator::new(
        store.clone(),
        OutputAssembler::new(store.clone(), artifacts.clone()),
        Notifier::new(Arc::new(HttpCallbackSink::new(config.callback_timeout)?)),
        clock.clone(),
    ));
    let dispatcher = Dispatcher::new(
        store.clone(),
        ids,
        clock,
        fetcher,
        transformer,
        artifacts,
        aggregator,
        &config,
    );

    let file = File::open(&args.batch_file)
        .with_context(|| format!("opening {}", args.batch_file.display()))?;
    let rows = read_rows(file).context("reading batch file")?;
    info!(rows = rows.len(), "batch file read");

    let source_name = args
        .batch_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let job_id = dispatcher
        .submit(rows, args.callback_url.clone(), source_name)
        .await?;
    info!(%job_id, "job submitted");

    let mut last_progress = u32::MAX;
    loop {
        let view = job_status(store.as_ref(), job_id)
            .await?
            .context("job vanished from the store")?;

        if view.progress != last_progress {
            info!(
                %job_id,
                status = ?view.status,
                progress = view.progress,
                processed = view.processed_items,
                total = view.total_items,
                "progress"
            );
            last_progress = view.progress;
        }

        if view.status.is_terminal() {
            println!("{}", serde_json::to_string_pretty(&view)?);
            if let Some(output_ref) = &view.output_ref {
                println!("output table: {}", args.artifact_dir.join(output_ref).display());
            }
            break;
        }
        sleep(Duration::from_millis(200)).await;
    }

    Ok(())
}
