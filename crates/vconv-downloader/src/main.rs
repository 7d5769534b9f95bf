//! Downloader worker binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use vconv_downloader::{metrics, RetrievalWorker, WorkerConfig};
use vconv_queue::RedisWorkQueue;
use vconv_telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting vconv-downloader");

    let config = WorkerConfig::from_env()?;
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        metrics::install_exporter(addr).context("Failed to start metrics exporter")?;
        info!(%addr, "Serving Prometheus metrics");
    }

    let queue = RedisWorkQueue::from_env(format!("downloader-{}", Uuid::new_v4()))
        .context("Failed to create work queue")?;
    queue
        .init(&config.source_queue)
        .await
        .context("Failed to initialize work queue")?;
    info!("Queue config: {:?}", queue.config());

    let messaging = TelegramClient::from_env().context("Failed to create Telegram client")?;

    let worker = RetrievalWorker::new(config, Arc::new(queue), Arc::new(messaging))
        .context("Failed to create retrieval worker")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    worker.run(shutdown_rx).await;

    info!("Downloader shutdown complete");
    Ok(())
}

/// Colored text for dev, JSON for production (`LOG_FORMAT=json`).
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("vconv_downloader=info,vconv_queue=info,vconv_telegram=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(_) => {
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
