// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;

use crate::engines::traits::SourceError;

/// 配置错误
///
/// 抓取器就绪检查失败时返回，在创建任何工作进程之前报告给调用方
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("configuration profile '{0}' does not exist")]
    MissingProfile(String),

    #[error("configuration profile '{profile}' is missing required fields: {}", .fields.join(", "))]
    MissingFields {
        profile: String,
        fields: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 消息构建错误
///
/// 单个条目无法转换为领域消息，记录日志后跳过该条目
#[derive(Error, Debug)]
pub enum MessageConstructionError {
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("payload for '{0}' is not a JSON object")]
    NotAnObject(String),
}

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("无效参数: {0}")]
    InvalidParameter(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<sea_orm::DbErr> for RepositoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        RepositoryError::DatabaseError(err.to_string())
    }
}

/// 消息总线错误
#[derive(Error, Debug)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode message: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("message bus has no subscribers")]
    NoSubscribers,
}

/// 工作进程终止错误
///
/// 工作进程未能在宽限期内停止，或其执行上下文发生崩溃
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessTerminationError {
    #[error("worker '{worker}' did not stop within {grace:?} and was aborted")]
    TimedOut { worker: String, grace: Duration },

    #[error("worker '{worker}' panicked: {reason}")]
    Panicked { worker: String, reason: String },
}

/// 抓取器运行错误
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 编排器错误类型
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{} worker(s) failed to terminate cleanly", .0.len())]
    Termination(Vec<ProcessTerminationError>),
}

/// 控制通道已关闭，对端已被丢弃
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("control channel closed")]
pub struct ChannelClosed;
