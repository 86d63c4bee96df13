// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::settings::ScraperSettings;
use crate::domain::models::message::{Channel, PublishEnvelope};
use crate::domain::repositories::item_repository::ItemRepository;
use crate::domain::services::message_bus::MessageBus;
use crate::engines::traits::{ItemSource, SourceItem};
use crate::workers::channel::{ControlChannel, ControlMessage};
use crate::workers::recent_items::RecentItemsCache;

/// 单轮检索的统计结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IterationStats {
    /// 新写入存储的条目数
    pub inserted: usize,
    /// 成功发布到总线的条目数
    pub published: usize,
    /// 命中最近条目缓存而跳过的条目数
    pub skipped_cached: usize,
    /// 存储中已存在而跳过的条目数
    pub skipped_existing: usize,
    /// 构建或写入失败的条目数
    pub failed: usize,
    /// 失败的数据源调用次数
    pub fetch_errors: usize,
}

/// 检索循环
///
/// 每个抓取器内嵌的轮询协议：
/// 休眠 → 处理控制消息 → 拉取数据源 → 去重 → 入库 → 发布。
/// 单个条目的错误只记录日志，不会中断循环
pub struct RetrievalLoop<I: SourceItem> {
    scraper: String,
    poll_interval: Duration,
    items_per_source: usize,
    topic: Channel,
    source: Arc<dyn ItemSource<Item = I>>,
    repository: Arc<dyn ItemRepository>,
    bus: Arc<dyn MessageBus>,
    recent: RecentItemsCache,
}

impl<I: SourceItem + 'static> RetrievalLoop<I> {
    pub fn new(
        scraper: impl Into<String>,
        settings: &ScraperSettings,
        source: Arc<dyn ItemSource<Item = I>>,
        repository: Arc<dyn ItemRepository>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            scraper: scraper.into(),
            poll_interval: settings.poll_interval(),
            items_per_source: settings.items_per_source,
            topic: Channel::Research,
            source,
            repository,
            bus,
            recent: RecentItemsCache::new(settings.recent_items_capacity),
        }
    }

    pub fn recent_items(&self) -> &RecentItemsCache {
        &self.recent
    }

    /// 运行循环直到令牌被取消
    ///
    /// 取消只在休眠点被观察，进行中的一轮检索会完整执行
    pub async fn run(&mut self, channel: &mut ControlChannel, shutdown: &CancellationToken) {
        info!(scraper = %self.scraper, "Starting the retrieval loop");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            self.drain_control(channel);

            let stats = self.run_iteration(channel).await;
            if stats.inserted > 0 || stats.failed > 0 || stats.fetch_errors > 0 {
                info!(scraper = %self.scraper, ?stats, "Retrieval iteration finished");
            } else {
                debug!(scraper = %self.scraper, ?stats, "Retrieval iteration finished");
            }
        }

        info!(scraper = %self.scraper, "Retrieval loop stopped");
    }

    fn drain_control(&self, channel: &mut ControlChannel) {
        while let Some(message) = channel.try_recv() {
            info!(scraper = %self.scraper, ?message, "Received control message");
        }
    }

    /// 执行一轮检索
    #[instrument(skip_all, fields(scraper = %self.scraper))]
    pub async fn run_iteration(&mut self, channel: &ControlChannel) -> IterationStats {
        let started = Instant::now();
        let mut stats = IterationStats::default();

        let sources = match self.source.followed_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                stats.fetch_errors += 1;
                counter!("scraper_fetch_errors_total", "scraper" => self.scraper.clone())
                    .increment(1);
                if e.is_retryable() {
                    warn!(scraper = %self.scraper, error = %e, "Failed to list followed sources");
                } else {
                    error!(scraper = %self.scraper, error = %e, "Failed to list followed sources");
                }
                return stats;
            }
        };

        for source in sources {
            let items = match self.source.newest_items(&source, self.items_per_source).await {
                Ok(items) => items,
                Err(e) => {
                    stats.fetch_errors += 1;
                    counter!("scraper_fetch_errors_total", "scraper" => self.scraper.clone())
                        .increment(1);
                    warn!(scraper = %self.scraper, source = %source, error = %e, "Failed to fetch newest items");
                    continue;
                }
            };

            for item in &items {
                self.process_item(item, channel, &mut stats).await;
            }
        }

        histogram!("scraper_iteration_duration_seconds", "scraper" => self.scraper.clone())
            .record(started.elapsed().as_secs_f64());
        stats
    }

    async fn process_item(&mut self, item: &I, channel: &ControlChannel, stats: &mut IterationStats) {
        if self.recent.contains(item.name()) {
            stats.skipped_cached += 1;
            self.skipped("cached");
            return;
        }

        let message = match item.to_message() {
            Ok(message) => message,
            Err(e) => {
                stats.failed += 1;
                self.skipped("construction");
                error!(scraper = %self.scraper, item = %item.name(), error = %e, "Error creating message");
                return;
            }
        };

        match self.repository.count_by_id(item.id()).await {
            Ok(0) => {}
            Ok(_) => {
                stats.skipped_existing += 1;
                self.skipped("existing");
                debug!(scraper = %self.scraper, item_id = %item.id(), "Item already stored");
                return;
            }
            Err(e) => {
                stats.failed += 1;
                self.skipped("store");
                error!(scraper = %self.scraper, item_id = %item.id(), error = %e, "Failed to query store");
                return;
            }
        }

        let mut row = message.payload.clone();
        item.normalize_for_store(&mut row);
        if let Err(e) = self.repository.insert(&row).await {
            stats.failed += 1;
            self.skipped("store");
            error!(scraper = %self.scraper, item_id = %item.id(), error = %e, "Failed to insert item");
            return;
        }
        stats.inserted += 1;

        // The row is committed at this point; a failed publish is not retried.
        match self.bus.publish(self.topic, &message).await {
            Ok(()) => stats.published += 1,
            Err(e) => {
                warn!(scraper = %self.scraper, item_id = %item.id(), error = %e, "Failed to publish message");
            }
        }

        let envelope = PublishEnvelope::new(self.topic, message);
        if channel.send(ControlMessage::Publish(envelope)).is_err() {
            debug!(scraper = %self.scraper, "Control channel closed, publish not forwarded");
        }

        self.recent.insert(item.name());
        counter!("scraper_items_ingested_total", "scraper" => self.scraper.clone()).increment(1);
    }

    fn skipped(&self, reason: &'static str) {
        counter!(
            "scraper_items_skipped_total",
            "scraper" => self.scraper.clone(),
            "reason" => reason
        )
        .increment(1);
    }
}
