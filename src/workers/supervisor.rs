// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::utils::errors::ProcessTerminationError;
use crate::workers::channel::ControlChannel;
use crate::workers::process::WorkerProcess;

/// 进程监督者
///
/// 持有所有工作进程，负责批量启动和停止
#[derive(Default)]
pub struct ProcessSupervisor {
    processes: Mutex<Vec<WorkerProcess>>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_process(&self, process: WorkerProcess) {
        debug!(scraper = %process.name(), "Registering worker process");
        self.processes.lock().push(process);
    }

    pub fn process_count(&self) -> usize {
        self.processes.lock().len()
    }

    pub fn running_count(&self) -> usize {
        self.processes
            .lock()
            .iter()
            .filter(|p| p.is_started() && !p.is_finished())
            .count()
    }

    /// 启动所有尚未启动的进程
    ///
    /// 按注册顺序返回新启动进程的控制通道，已启动的进程不会重复启动
    pub fn start_all_processes(&self) -> Vec<ControlChannel> {
        let mut processes = self.processes.lock();
        let channels: Vec<ControlChannel> =
            processes.iter_mut().filter_map(|p| p.start()).collect();
        info!(started = channels.len(), total = processes.len(), "Started worker processes");
        channels
    }

    /// 停止并移除所有进程
    ///
    /// 等待每个进程退出；所有进程都会被处理，失败项汇总后返回
    pub async fn stop_all_processes(&self) -> Result<(), Vec<ProcessTerminationError>> {
        let mut processes = std::mem::take(&mut *self.processes.lock());
        if processes.is_empty() {
            return Ok(());
        }

        let results = join_all(processes.iter_mut().map(|p| p.stop())).await;
        let failures: Vec<ProcessTerminationError> =
            results.into_iter().filter_map(Result::err).collect();

        info!(
            stopped = processes.len(),
            failed = failures.len(),
            "Stopped worker processes"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}
