// Main entry point for the promo worker

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gemini_client::GeminiClient;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker_core::kernel::jobs::{
    reconcile_stuck_jobs, Dispatcher, JobQueue, PostgresJobQueue, QueueConfig,
};
use worker_core::kernel::{
    BaseCopywriter, ChromiumRenderer, GeminiCopywriter, HttpPageFetcher, NoopCopywriter,
    S3ObjectStorage, WorkerDeps,
};
use worker_core::Config;

/// Cadence of the stuck-job reconciliation sweep.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// Pending jobs older than this get their queue message re-sent.
const RECONCILE_STALE_AFTER: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,worker_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting promo worker");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Object storage
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let storage = Arc::new(S3ObjectStorage::new(aws_sdk_s3::Client::new(&aws_config)));

    // Outbound HTTP for brand and product scraping
    let fetcher = Arc::new(HttpPageFetcher::new().context("Failed to build HTTP client")?);

    // Headless browser
    let renderer = Arc::new(ChromiumRenderer::new(
        config.chromium_path.clone().map(PathBuf::from),
        Duration::from_secs(config.render_timeout_secs),
    ));

    // Generated copy degrades to empty strings without an API key
    let copywriter: Arc<dyn BaseCopywriter> = match config.gemini_api_key.clone() {
        Some(api_key) => Arc::new(GeminiCopywriter::new(GeminiClient::new(api_key))),
        None => {
            tracing::warn!("GEMINI_API_KEY not set, generated copy disabled");
            Arc::new(NoopCopywriter)
        }
    };

    // Queue
    let queue = Arc::new(PostgresJobQueue::with_config(
        pool.clone(),
        QueueConfig {
            visibility_timeout: Duration::from_secs(config.queue_visibility_timeout_secs),
            max_receive_count: config.queue_max_receive_count,
            ..QueueConfig::default()
        },
    ));

    // Shutdown on ctrl-c
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    // Background sweep re-enqueueing pending jobs whose message got lost
    let reconcile_pool = pool.clone();
    let reconcile_queue: Arc<dyn JobQueue> = queue.clone();
    let reconcile_token = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RECONCILE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = reconcile_token.cancelled() => break,
                _ = interval.tick() => {
                    match reconcile_stuck_jobs(
                        &reconcile_pool,
                        reconcile_queue.as_ref(),
                        RECONCILE_STALE_AFTER,
                    )
                    .await
                    {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(jobs = n, "Re-enqueued stale pending jobs"),
                        Err(e) => tracing::warn!(error = %e, "Stuck-job reconciliation failed"),
                    }
                }
            }
        }
    });

    let deps = WorkerDeps::new(
        pool,
        queue,
        storage,
        fetcher,
        renderer,
        copywriter,
        config.uploads_bucket,
        config.assets_bucket,
    );

    Dispatcher::new(deps).run(shutdown).await?;

    tracing::info!("Worker stopped");
    Ok(())
}
