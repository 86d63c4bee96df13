// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use redis::AsyncCommands;

/// Redis客户端
///
/// 提供对Redis的异步操作接口，消息总线通过它发布消息
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(RedisError)` - URL 无法解析
    pub fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 向频道发布消息
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 收到消息的订阅者数量
    /// * `Err(RedisError)` - 发布失败
    pub async fn publish(&self, channel: &str, payload: &str) -> redis::RedisResult<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let receivers: i64 = con.publish(channel, payload).await?;
        Ok(receivers)
    }

    /// 检查连接是否可用
    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut con).await
    }
}
