use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Parser;
use tracing::info;

use article_scanner::aggregator::StrategySource;
use article_scanner::config::Config;
use article_scanner::fetcher::{HttpDownloader, HttpFetcher};
use article_scanner::llm_adapter::ChatRelayClient;
use article_scanner::ml_client::MlClient;
use article_scanner::notifier::TelegramNotifier;
use article_scanner::pipeline::IngestionPipeline;
use article_scanner::repository::PostgresRepository;
use article_scanner::scanner::{ArxivScanner, ScannerRegistry};
use article_scanner::scheduler;
use article_scanner::traits::DocumentFetcher;

/// Scans configured listing sites for one day's articles and runs the
/// ingestion pipeline over the results.
#[derive(Parser, Debug)]
#[command(name = "article-scanner", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target day (YYYY-MM-DD, UTC). Defaults to today.
    #[arg(long)]
    day: Option<NaiveDate>,

    /// Keep running and trigger a cycle every N seconds.
    #[arg(long, value_name = "SECONDS")]
    watch: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("load configuration")?;

    let fetcher: Arc<dyn DocumentFetcher> = Arc::new(HttpFetcher::new()?);
    let mut registry = ScannerRegistry::new();
    registry.register(Arc::new(ArxivScanner::new(fetcher)));

    let source = Arc::new(StrategySource::new(registry, config.sites.clone()));
    let mut pipeline = IngestionPipeline::new(source);

    if !config.database.url.is_empty() {
        let repository = PostgresRepository::connect(&config.database.url)
            .await
            .context("connect to database")?;
        pipeline = pipeline.with_repository(Arc::new(repository));
        info!("persistence enabled");
    }

    if !config.ml.inference_url.is_empty() {
        let api_key = (!config.ml.api_key.is_empty()).then(|| config.ml.api_key.clone());
        let ml = Arc::new(MlClient::new(&config.ml.inference_url, api_key)?);
        pipeline = pipeline
            .with_analyzer(ml.clone())
            .with_summarizer(ml)
            .with_downloader(Arc::new(HttpDownloader::new()?));
        info!("enrichment enabled");
    }

    if !config.chat_relay.api_key.is_empty() {
        pipeline = pipeline.with_chat_client(Arc::new(ChatRelayClient::new(&config.chat_relay)?));
        info!("chat relay enabled");
    }

    if !config.telegram.bot_token.is_empty() {
        pipeline = pipeline.with_notifier(Arc::new(TelegramNotifier::new(
            &config.telegram.bot_token,
            &config.telegram.chat_id,
        )?));
        info!("telegram notifications enabled");
    }

    if let Some(seconds) = cli.watch {
        scheduler::run_interval(&pipeline, Duration::from_secs(seconds)).await;
        return Ok(());
    }

    let day = match cli.day {
        Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };
    info!(day = %day.date_naive(), "running single cycle");
    pipeline.process_day(day).await?;
    Ok(())
}
