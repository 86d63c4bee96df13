// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::{ConfigurationError, ScraperError};
use crate::workers::channel::ControlChannel;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Scraper trait定义
///
/// 所有数据源抓取器都必须实现此trait。`start` 在独立任务中运行检索循环，
/// 直到 `shutdown` 被取消或 `stop` 被调用
#[async_trait]
pub trait Scraper: Send + Sync {
    /// 获取抓取器名称
    fn name(&self) -> &str;

    /// 运行抓取器，阻塞直到检索循环退出
    ///
    /// 每个执行上下文持有自己的 `shutdown` 令牌，令牌可能在任务首次被调度前就已取消
    async fn start(
        &self,
        channel: ControlChannel,
        shutdown: CancellationToken,
    ) -> Result<(), ScraperError>;

    /// 请求所有执行上下文停止，循环在下一个休眠点退出
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// 检查运行所需的配置是否齐全
    fn validate_readiness(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }
}
