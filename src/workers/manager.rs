// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{select_all, StreamExt};
use metrics::counter;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::config::settings::ScraperSettings;
use crate::utils::errors::{ConfigurationError, OrchestratorError};
use crate::workers::channel::{ControlChannel, ControlMessage, ControlSender};
use crate::workers::process::WorkerProcess;
use crate::workers::supervisor::ProcessSupervisor;
use crate::workers::worker::Scraper;

/// 抓取器编排器
///
/// 注册抓取器、检查就绪状态，并把生命周期委托给进程监督者。
/// `start_scrapers` 在调用方任务中运行消息转发循环
pub struct ScraperOrchestrator {
    scrapers: RwLock<Vec<Arc<dyn Scraper>>>,
    supervisor: ProcessSupervisor,
    grace_period: Duration,
    relay_idle_timeout: Duration,
}

impl ScraperOrchestrator {
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            scrapers: RwLock::new(Vec::new()),
            supervisor: ProcessSupervisor::new(),
            grace_period: settings.stop_grace_period(),
            relay_idle_timeout: settings.relay_idle_timeout(),
        }
    }

    /// 注册抓取器
    ///
    /// 就绪检查失败时返回 `ConfigurationError`，不会创建工作进程。
    /// 同一抓取器注册两次会得到两个工作进程
    pub fn add_scraper(&self, scraper: Arc<dyn Scraper>) -> Result<(), ConfigurationError> {
        if let Err(e) = scraper.validate_readiness() {
            warn!(scraper = %scraper.name(), error = %e, "Scraper failed readiness check");
            return Err(e);
        }

        self.supervisor
            .add_process(WorkerProcess::new(scraper.clone(), self.grace_period));
        info!(scraper = %scraper.name(), "Scraper registered");
        self.scrapers.write().push(scraper);
        Ok(())
    }

    /// 依次注册多个抓取器，遇到第一个失败即停止，已注册的不回滚
    pub fn add_scrapers<I>(&self, scrapers: I) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = Arc<dyn Scraper>>,
    {
        for scraper in scrapers {
            self.add_scraper(scraper)?;
        }
        Ok(())
    }

    /// 按实例身份判断抓取器是否已注册
    pub fn has_scraper(&self, scraper: &Arc<dyn Scraper>) -> bool {
        let target = Arc::as_ptr(scraper) as *const ();
        self.scrapers
            .read()
            .iter()
            .any(|s| Arc::as_ptr(s) as *const () == target)
    }

    pub fn scraper_count(&self) -> usize {
        self.scrapers.read().len()
    }

    pub fn process_count(&self) -> usize {
        self.supervisor.process_count()
    }

    pub fn running_count(&self) -> usize {
        self.supervisor.running_count()
    }

    /// 启动所有抓取器并转发消息
    ///
    /// 工作进程发来的消息原样转发给调用方；调用方发来的 `Stop` 结束转发，
    /// 但不会停止工作进程，其余消息下发给每个工作进程
    pub async fn start_scrapers(&self, caller: ControlChannel) {
        let channels = self.supervisor.start_all_processes();

        let mut downstream: Vec<ControlSender> = Vec::with_capacity(channels.len());
        let mut upstream = Vec::with_capacity(channels.len());
        for channel in channels {
            let (tx, rx) = channel.into_split();
            downstream.push(tx);
            upstream.push(rx.into_stream());
        }

        let mut workers_open = !upstream.is_empty();
        let mut workers = select_all(upstream);
        let (caller_tx, mut caller_rx) = caller.into_split();

        info!(workers = downstream.len(), "Relaying scraper messages");

        loop {
            tokio::select! {
                message = workers.next(), if workers_open => match message {
                    Some(message) => {
                        counter!("orchestrator_messages_relayed_total").increment(1);
                        if caller_tx.send(message).is_err() {
                            warn!("Caller channel closed, ending relay");
                            break;
                        }
                    }
                    None => {
                        debug!("All worker channels closed");
                        workers_open = false;
                    }
                },
                message = caller_rx.recv() => match message {
                    Some(ControlMessage::Stop) => {
                        info!("Stop received from caller, ending relay");
                        break;
                    }
                    Some(message) => {
                        for tx in &downstream {
                            if tx.send(message.clone()).is_err() {
                                trace!("Worker channel closed, message dropped");
                            }
                        }
                    }
                    None => {
                        info!("Caller channel closed, ending relay");
                        break;
                    }
                },
                _ = tokio::time::sleep(self.relay_idle_timeout) => {
                    trace!("Relay idle");
                }
            }
        }
    }

    /// 停止所有抓取器
    ///
    /// 停止后为每个已注册的抓取器重新创建未启动的工作进程，
    /// 之后可以再次调用 `start_scrapers`
    pub async fn stop_scrapers(&self) -> Result<(), OrchestratorError> {
        let result = self.supervisor.stop_all_processes().await;

        let scrapers: Vec<Arc<dyn Scraper>> = self.scrapers.read().clone();
        for scraper in scrapers {
            self.supervisor
                .add_process(WorkerProcess::new(scraper, self.grace_period));
        }

        match result {
            Ok(()) => {
                info!("All scrapers stopped");
                Ok(())
            }
            Err(failures) => {
                for failure in &failures {
                    error!(error = %failure, "Worker termination failed");
                }
                Err(OrchestratorError::Termination(failures))
            }
        }
    }
}
