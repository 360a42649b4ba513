//! Batch OCR worker binary.
//!
//! Queues each image as one clip, recognizes them in order and writes the
//! combined text export.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{debug, info, warn};

use clipocr_ledger::{CreditLedger, InMemoryLedger};
use clipocr_models::{Clip, ProgressEvent};
use clipocr_ocr_client::OcrClient;
use clipocr_queue::WorkQueue;
use clipocr_worker::export::export_all_today;
use clipocr_worker::{init_tracing, BatchProcessor, CreditGate, Orchestrator, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "clipocr-worker")]
#[command(about = "Recognize text in image clips with a remote OCR service", long_about = None)]
struct Cli {
    /// Image files, one clip each, processed in the given order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Layout hint sent to the service (overrides WORKER_REQUEST_TAG)
    #[arg(short, long)]
    tag: Option<String>,

    /// Directory for the text export
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Charge recognized clips to this user
    #[arg(short, long)]
    user: Option<String>,

    /// Starting balance for --user
    #[arg(long, default_value = "0", requires = "user")]
    credits: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();

    let mut config = WorkerConfig::from_env();
    if cli.tag.is_some() {
        config = config.with_request_tag(cli.tag.clone());
    }
    info!("Worker config: {:?}", config);

    let client = OcrClient::new(config.ocr.clone()).context("Failed to create OCR client")?;
    if !client.health_check().await {
        warn!(endpoint = %config.ocr.endpoint, "OCR service did not pass health check");
    }

    let queue = WorkQueue::shared();
    {
        let mut queue = queue.write().await;
        for (index, path) in cli.images.iter().enumerate() {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            queue.add(Clip::new(bytes, format!("Clip {}", index + 1)).with_source(source))?;
        }
    }

    let processor = Arc::new(
        BatchProcessor::new(queue.clone(), client, config.progress_capacity)
            .with_request_tag(config.request_tag.clone()),
    );

    let mut events = processor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ProgressEvent::BatchProgress { processed, total } = event {
                info!(processed = processed, total = total, "Progress");
            } else {
                debug!(?event, "Progress event");
            }
        }
    });

    let cancel = processor.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping after the current clip");
            cancel.cancel();
        }
    });

    let gate = match &cli.user {
        Some(user) => {
            let ledger: Arc<dyn CreditLedger> =
                Arc::new(InMemoryLedger::with_balance(user.clone(), cli.credits));
            Some(CreditGate::new(ledger, user.clone()).with_credits_per_clip(config.credits_per_clip))
        }
        None => None,
    };
    let orchestrator = Orchestrator::new(processor, gate);

    let result = orchestrator.run().await?;
    info!(
        total = result.total,
        succeeded = result.success_count,
        failed = result.failed_count,
        cancelled = result.cancelled,
        "Batch finished"
    );

    if let Some(gate) = orchestrator.credits() {
        let balance = gate.ledger.get_balance(&gate.user_id).await?;
        info!(user_id = %gate.user_id, balance = balance, "Remaining credits");
    }

    let export = export_all_today(queue.read().await.all());
    match export {
        Some(file) => {
            let path = file.write_to(&cli.output).await?;
            info!(path = %path.display(), "Export written");
        }
        None => warn!("No clips were recognized, nothing to export"),
    }

    Ok(())
}
