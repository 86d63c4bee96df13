// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use stockwatch_ingest::config::settings::Settings;
use stockwatch_ingest::infrastructure::cache::redis_client::RedisClient;
use stockwatch_ingest::infrastructure::database::connection;
use stockwatch_ingest::infrastructure::metrics;
use stockwatch_ingest::infrastructure::repositories::reddit_submission_repo_impl::DatabaseRepositoryProvider;
use stockwatch_ingest::infrastructure::services::message_bus_impl::RedisMessageBus;
use stockwatch_ingest::utils::telemetry;
use stockwatch_ingest::workers::reddit_scraper::RedditScraper;
use stockwatch_ingest::workers::{ControlChannel, ControlMessage, Scraper, ScraperOrchestrator};

/// 主函数
///
/// 初始化配置、日志、数据库和消息总线，注册抓取器并转发消息直到收到 Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(settings.json_logs);
    info!("Starting stockwatch-ingest...");

    if settings.metrics.enabled {
        let addr: SocketAddr = settings.metrics.listen_addr.parse()?;
        metrics::init_metrics(addr);
    }

    // 3. Apply migrations once; workers open their own pools
    let db = connection::create_pool(&settings.database).await?;
    connection::run_migrations(&db).await?;
    db.close().await?;

    // 4. Message bus
    let redis = RedisClient::new(&settings.redis.url)?;
    if let Err(e) = redis.ping().await {
        warn!(error = %e, "Redis is not reachable yet, publishes will fail until it is");
    }
    let bus = Arc::new(RedisMessageBus::new(redis));

    // 5. Register scrapers
    let repositories = Arc::new(DatabaseRepositoryProvider::new(settings.database.clone()));
    let reddit: Arc<dyn Scraper> = Arc::new(RedditScraper::new(
        settings.reddit.clone(),
        settings.scraper.clone(),
        repositories,
        bus,
    ));

    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings.scraper));
    orchestrator.add_scrapers([reddit])?;

    // 6. Relay until shutdown
    let (mut caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };

    loop {
        tokio::select! {
            message = caller.recv() => match message {
                Some(ControlMessage::Publish(envelope)) => {
                    info!(channel = %envelope.channel, header = %envelope.message.header, "Scraper published message");
                }
                Some(ControlMessage::Stop) => {}
                None => break,
            },
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Shutdown signal received"),
                    Err(err) => error!("Unable to listen for shutdown signal: {}", err),
                }
                break;
            }
        }
    }

    info!("Shutting down scrapers...");
    let _ = caller.send(ControlMessage::Stop);
    if let Err(e) = relay.await {
        error!(error = %e, "Relay task failed");
    }
    orchestrator.stop_scrapers().await?;

    info!("Scrapers shut down successfully");
    Ok(())
}
