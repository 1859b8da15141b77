use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use mobi_bridge::api::{ApiServer, AppState};
use mobi_bridge::config::{AppConfig, Cli};
use mobi_bridge::pipeline::ConversionPipeline;
use mobi_bridge::registry::SlugRegistry;
use mobi_bridge::telegram::{Dispatcher, TelegramClient};
use mobi_bridge::tools::{ProcessConverter, ProcessDownloader};
use mobi_bridge::{logging, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so its values act as flag fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(cli.log_filter.as_deref())?;

    let config = AppConfig::from_cli(cli)?;

    utils::fs::ensure_dir_all(&config.pipeline.upload_dir)
        .await
        .context("upload directory is not usable")?;

    let telegram = Arc::new(TelegramClient::new(config.telegram_token.clone()));
    let me = telegram
        .get_me()
        .await
        .context("failed to authorize with Telegram")?;
    tracing::info!(
        "Authorized on account @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let registry = Arc::new(SlugRegistry::new());
    let pipeline = Arc::new(ConversionPipeline::new(
        config.pipeline.clone(),
        registry.clone(),
        Arc::new(ProcessDownloader::new(config.downloader.clone())),
        Arc::new(ProcessConverter::new(config.converter.clone())),
        telegram.clone(),
    ));

    let cancel = CancellationToken::new();

    let server = ApiServer::new(config.api.clone(), AppState::new(registry), cancel.clone());
    let server_handle = tokio::spawn(async move {
        let result = server.run().await;
        // A dead retrieval server takes the bot down with it
        server.shutdown();
        result
    });

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        });
    }

    let dispatcher = Dispatcher::new(telegram.clone(), pipeline);
    let polled = dispatcher.run(&telegram, cancel.clone()).await;
    // Stop the server whether polling ended by signal or error
    cancel.cancel();

    let served = server_handle.await.context("retrieval server task panicked")?;
    polled?;
    served?;

    tracing::info!("mobi-bridge stopped");
    Ok(())
}
