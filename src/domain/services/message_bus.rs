// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::message::{Channel, DomainMessage};
use crate::utils::errors::BusError;
use async_trait::async_trait;

/// 消息总线服务特质
///
/// 发布即返回，不等待订阅方确认。总线句柄在构造检索循环时注入。
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, channel: Channel, message: &DomainMessage) -> Result<(), BusError>;
}
