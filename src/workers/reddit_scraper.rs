// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::settings::{RedditSettings, ScraperSettings};
use crate::domain::models::reddit_submission::RedditSubmission;
use crate::domain::repositories::item_repository::ItemRepositoryProvider;
use crate::domain::services::message_bus::MessageBus;
use crate::engines::reddit_api::RedditApiClient;
use crate::engines::traits::ItemSource;
use crate::utils::errors::{ConfigurationError, ScraperError};
use crate::workers::channel::ControlChannel;
use crate::workers::retrieval_loop::RetrievalLoop;
use crate::workers::worker::Scraper;

type SubmissionSource = Arc<dyn ItemSource<Item = RedditSubmission>>;

/// 正在运行的执行上下文，按编号索引
///
/// 同一个抓取器注册多次时每个进程各占一项
#[derive(Default)]
struct ActiveRuns {
    next: AtomicU64,
    tokens: Mutex<HashMap<u64, CancellationToken>>,
}

impl ActiveRuns {
    fn enter(&self, shutdown: &CancellationToken) -> RunGuard<'_> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.tokens.lock().insert(id, shutdown.clone());
        RunGuard { runs: self, id }
    }

    fn cancel_all(&self) -> usize {
        let tokens: Vec<CancellationToken> = self.tokens.lock().drain().map(|(_, t)| t).collect();
        for token in &tokens {
            token.cancel();
        }
        tokens.len()
    }

    fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}

/// 任务退出或被中止时移除对应的运行项
struct RunGuard<'a> {
    runs: &'a ActiveRuns,
    id: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.runs.tokens.lock().remove(&self.id);
    }
}

/// Reddit 抓取器
///
/// 轮询账号订阅的版块，把新帖子写入 `reddit_submissions` 表并发布到研究频道
pub struct RedditScraper {
    reddit: RedditSettings,
    settings: ScraperSettings,
    repositories: Arc<dyn ItemRepositoryProvider>,
    bus: Arc<dyn MessageBus>,
    source: Mutex<Option<SubmissionSource>>,
    runs: ActiveRuns,
}

impl RedditScraper {
    pub fn new(
        reddit: RedditSettings,
        settings: ScraperSettings,
        repositories: Arc<dyn ItemRepositoryProvider>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            reddit,
            settings,
            repositories,
            bus,
            source: Mutex::new(None),
            runs: ActiveRuns::default(),
        }
    }

    /// 使用指定的数据源代替 Reddit API 客户端
    pub fn with_source(self, source: SubmissionSource) -> Self {
        *self.source.lock() = Some(source);
        self
    }

    fn build_source(&self) -> Result<SubmissionSource, ScraperError> {
        if let Some(source) = self.source.lock().clone() {
            return Ok(source);
        }
        let profile = self.reddit.validate_profile(&self.reddit.site_name)?.clone();
        Ok(Arc::new(RedditApiClient::new(&self.reddit, profile)?))
    }

    async fn run(
        &self,
        mut channel: ControlChannel,
        shutdown: &CancellationToken,
    ) -> Result<(), ScraperError> {
        self.validate_readiness()?;
        let source = self.build_source()?;
        let repository = self.repositories.connect().await?;

        let mut retrieval = RetrievalLoop::new(
            self.name(),
            &self.settings,
            source,
            repository,
            self.bus.clone(),
        );
        retrieval.run(&mut channel, shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl Scraper for RedditScraper {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn start(
        &self,
        channel: ControlChannel,
        shutdown: CancellationToken,
    ) -> Result<(), ScraperError> {
        if shutdown.is_cancelled() {
            info!("Stop requested before the reddit scraper started");
            return Ok(());
        }

        let _run = self.runs.enter(&shutdown);
        info!(profile = %self.reddit.site_name, "Starting reddit scraper");
        self.run(channel, &shutdown).await
    }

    fn stop(&self) {
        let cancelled = self.runs.cancel_all();
        debug!(runs = cancelled, "Stop requested for reddit scraper");
    }

    fn is_running(&self) -> bool {
        !self.runs.is_empty()
    }

    fn validate_readiness(&self) -> Result<(), ConfigurationError> {
        self.reddit.validate_profile(&self.reddit.site_name).map(|_| ())
    }
}
