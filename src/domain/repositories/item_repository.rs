// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::message::Payload;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use std::sync::Arc;

/// 采集条目仓库特质
///
/// 定义已采集条目的持久化接口，负载字段名与表列名一一对应
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// 统计指定ID的行数
    async fn count_by_id(&self, id: &str) -> Result<u64, RepositoryError>;
    /// 插入一行并提交
    async fn insert(&self, payload: &Payload) -> Result<(), RepositoryError>;
    /// 根据ID读取一行
    async fn find_by_id(&self, id: &str) -> Result<Option<Payload>, RepositoryError>;
}

/// 仓库提供者特质
///
/// 每个工作进程在启动时打开自己的仓库连接，不与其他工作进程共享
#[async_trait]
pub trait ItemRepositoryProvider: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ItemRepository>, RepositoryError>;
}
