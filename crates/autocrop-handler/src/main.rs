use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use autocrop_core::CropPipeline;
use autocrop_handler::{dry_run, handle_notification, HandlerConfig, S3Storage};
use clap::Parser;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "autocrop=info,autocrop_core=info,autocrop_handler=info";

#[derive(Parser, Debug)]
#[command(
    name = "autocrop",
    version,
    about = "Crop an uploaded image to its most important region"
)]
struct Args {
    /// Notification payload file, or `-` for stdin
    #[arg(long, default_value = "-")]
    event: PathBuf,

    /// Print the parsed request and derived destination without touching storage
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries only the JSON response
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = HandlerConfig::from_env().context("invalid autocrop configuration")?;
    let payload = read_payload(&args.event).await?;

    if args.dry_run {
        return Ok(emit(dry_run(&config.crop, &payload)));
    }

    let storage = S3Storage::connect(config.s3_endpoint.as_deref()).await;
    let pipeline = CropPipeline::new(storage, config.crop)?;
    info!(
        target_width = pipeline.config().target_width,
        target_height = pipeline.config().target_height,
        "autocrop ready"
    );

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let outcome = handle_notification(&pipeline, &payload, &cancel).await;
    watcher.abort();

    Ok(emit(outcome))
}

fn emit<T: Serialize, E: Serialize>(outcome: Result<T, E>) -> ExitCode {
    let (body, code) = match outcome {
        Ok(response) => (serde_json::to_string(&response), ExitCode::SUCCESS),
        Err(response) => (serde_json::to_string(&response), ExitCode::FAILURE),
    };
    match body {
        Ok(body) => {
            println!("{body}");
            code
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response");
            ExitCode::FAILURE
        }
    }
}

async fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut payload = String::new();
        tokio::io::stdin()
            .read_to_string(&mut payload)
            .await
            .context("reading notification from stdin")?;
        Ok(payload)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading notification from {}", path.display()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, cancelling in-flight storage calls");
        },
        _ = terminate => {
            info!("SIGTERM received, cancelling in-flight storage calls");
        },
    }
}
