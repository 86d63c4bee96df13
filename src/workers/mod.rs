// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供抓取器编排功能
/// 包括控制通道、工作进程隔离、进程监督和检索循环
pub mod channel;
pub mod manager;
pub mod process;
pub mod recent_items;
pub mod reddit_scraper;
pub mod retrieval_loop;
pub mod supervisor;
pub mod worker;

pub use channel::{ControlChannel, ControlMessage};
pub use manager::ScraperOrchestrator;
pub use worker::Scraper;
