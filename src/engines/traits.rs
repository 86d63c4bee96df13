// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::message::{DomainMessage, Payload};
use crate::utils::errors::MessageConstructionError;

/// 数据源错误
///
/// 调用外部数据源失败，属于瞬时错误，下一轮循环重试
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl SourceError {
    /// 判断错误是否可在下一轮重试
    ///
    /// 认证错误需要修正配置，其余错误视为瞬时错误
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Request(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            SourceError::Authentication(_) => false,
            SourceError::UnexpectedResponse(_) => true,
        }
    }
}

/// 数据源条目
///
/// 由数据源返回的单个条目，能够构建领域消息
pub trait SourceItem: Send + Sync {
    /// 稳定名称，用于最近条目缓存去重
    fn name(&self) -> &str;

    /// 持久化主键
    fn id(&self) -> &str;

    /// 构建领域消息
    fn to_message(&self) -> Result<DomainMessage, MessageConstructionError>;

    /// 入库前规范化类型不固定的字段
    fn normalize_for_store(&self, _payload: &mut Payload) {}
}

/// 数据源特质
///
/// 所有外部数据源客户端都必须实现此trait
#[async_trait]
pub trait ItemSource: Send + Sync {
    type Item: SourceItem;

    /// 获取当前关注的数据源列表（例如订阅的版块）
    async fn followed_sources(&self) -> Result<Vec<String>, SourceError>;

    /// 获取指定数据源最新的 `limit` 个条目
    async fn newest_items(&self, source: &str, limit: usize)
        -> Result<Vec<Self::Item>, SourceError>;
}
