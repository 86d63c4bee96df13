// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::models::message::{Channel, DomainMessage, PublishEnvelope};
use crate::domain::services::message_bus::MessageBus;
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::utils::errors::BusError;

/// 基于 Redis PUBLISH 的消息总线
///
/// 消息以 JSON 编码发布到与频道同名的 Redis 频道
pub struct RedisMessageBus {
    redis: RedisClient,
    prefix: String,
}

impl RedisMessageBus {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis,
            prefix: "stock_watch".to_string(),
        }
    }

    /// 设置频道名前缀
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn topic(&self, channel: Channel) -> String {
        format!("{}:{}", self.prefix, channel)
    }
}

#[async_trait]
impl MessageBus for RedisMessageBus {
    async fn publish(&self, channel: Channel, message: &DomainMessage) -> Result<(), BusError> {
        let body = serde_json::to_string(message)?;
        let topic = self.topic(channel);
        let receivers = self.redis.publish(&topic, &body).await?;
        counter!("bus_messages_published_total", "channel" => channel.as_str()).increment(1);
        debug!(topic = %topic, receivers, header = %message.header, "published message");
        Ok(())
    }
}

/// 进程内消息总线
///
/// 基于 `tokio::sync::broadcast`，用于本地运行和测试
pub struct InMemoryMessageBus {
    sender: broadcast::Sender<PublishEnvelope>,
}

impl InMemoryMessageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 订阅所有频道
    pub fn subscribe(&self) -> broadcast::Receiver<PublishEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, channel: Channel, message: &DomainMessage) -> Result<(), BusError> {
        self.sender
            .send(PublishEnvelope::new(channel, message.clone()))
            .map(|_| ())
            .map_err(|_| BusError::NoSubscribers)
    }
}
