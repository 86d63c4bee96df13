// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::utils::errors::MessageConstructionError;

/// 消息负载
///
/// 字段名到字段值的有序映射，字段名与持久化表的列名一一对应
pub type Payload = serde_json::Map<String, Value>;

/// 消息总线频道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// 研究频道，新采集的条目发布于此
    Research,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Research => "research",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 领域消息
///
/// 由主题标签和结构化负载组成，表示一个已采集的条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainMessage {
    /// 主题标签，例如 `reddit_submission`
    pub header: String,
    /// 结构化负载
    pub payload: Payload,
}

impl DomainMessage {
    pub fn new(header: impl Into<String>, payload: Payload) -> Self {
        Self {
            header: header.into(),
            payload,
        }
    }

    /// 从可序列化的模型构建消息
    ///
    /// # 返回值
    ///
    /// * `Ok(DomainMessage)` - 模型序列化为 JSON 对象
    /// * `Err(MessageConstructionError)` - 序列化失败或结果不是对象
    pub fn from_model<T: Serialize>(
        header: &str,
        model: &T,
    ) -> Result<Self, MessageConstructionError> {
        match serde_json::to_value(model)? {
            Value::Object(payload) => Ok(Self::new(header, payload)),
            _ => Err(MessageConstructionError::NotAnObject(header.to_string())),
        }
    }
}

/// 发布信封
///
/// 将领域消息与目标频道配对，用于总线投递
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishEnvelope {
    pub channel: Channel,
    pub message: DomainMessage,
}

impl PublishEnvelope {
    pub fn new(channel: Channel, message: DomainMessage) -> Self {
        Self { channel, message }
    }
}
