// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::utils::errors::ProcessTerminationError;
use crate::workers::channel::ControlChannel;
use crate::workers::worker::Scraper;

/// 工作进程
///
/// 将一个抓取器放在独立的 tokio 任务中运行，并持有与之相连的控制通道。
/// 每个工作进程最多只有一个存活的执行上下文
pub struct WorkerProcess {
    scraper: Arc<dyn Scraper>,
    grace_period: Duration,
    handle: Option<JoinHandle<()>>,
    shutdown: Option<CancellationToken>,
}

impl WorkerProcess {
    pub fn new(scraper: Arc<dyn Scraper>, grace_period: Duration) -> Self {
        Self {
            scraper,
            grace_period,
            handle: None,
            shutdown: None,
        }
    }

    pub fn name(&self) -> &str {
        self.scraper.name()
    }

    pub fn scraper(&self) -> &Arc<dyn Scraper> {
        &self.scraper
    }

    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// 执行上下文是否已退出
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_finished())
    }

    /// 启动执行上下文
    ///
    /// # 返回值
    ///
    /// * `Some(ControlChannel)` - 监督者一端的控制通道
    /// * `None` - 进程已经启动过
    pub fn start(&mut self) -> Option<ControlChannel> {
        if self.handle.is_some() {
            return None;
        }

        let (supervisor_end, worker_end) = ControlChannel::pair();
        // 令牌在任务调度前创建，停止请求不会因任务尚未运行而丢失
        let shutdown = CancellationToken::new();
        let scraper = self.scraper.clone();
        let span = info_span!("worker", scraper = %scraper.name());

        let token = shutdown.clone();
        let handle = tokio::spawn(
            async move {
                match scraper.start(worker_end, token).await {
                    Ok(()) => info!("Scraper exited"),
                    Err(e) => error!(error = %e, "Scraper exited with error"),
                }
            }
            .instrument(span),
        );

        self.handle = Some(handle);
        self.shutdown = Some(shutdown);
        Some(supervisor_end)
    }

    /// 停止执行上下文
    ///
    /// 先请求抓取器停止并取消本进程的令牌，等待宽限期；超时后强制中止任务并报告
    pub async fn stop(&mut self) -> Result<(), ProcessTerminationError> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };

        self.scraper.stop();
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.cancel();
        }

        match tokio::time::timeout(self.grace_period, &mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_panic() => {
                let reason = panic_reason(e.into_panic());
                error!(scraper = %self.name(), reason = %reason, "Worker panicked");
                Err(ProcessTerminationError::Panicked {
                    worker: self.name().to_string(),
                    reason,
                })
            }
            Ok(Err(_)) => Ok(()),
            Err(_) => {
                handle.abort();
                let _ = handle.await;
                warn!(scraper = %self.name(), grace = ?self.grace_period, "Worker aborted after grace period");
                Err(ProcessTerminationError::TimedOut {
                    worker: self.name().to_string(),
                    grace: self.grace_period,
                })
            }
        }
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
