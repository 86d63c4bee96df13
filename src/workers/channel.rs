// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::domain::models::message::PublishEnvelope;
use crate::utils::errors::ChannelClosed;

/// 控制消息
///
/// 向下传递控制信号，向上传递发布信封
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// 停止信号
    Stop,
    /// 工作进程发布的新条目
    Publish(PublishEnvelope),
}

/// 双向控制通道的一端
///
/// 通过 [`ControlChannel::pair`] 成对创建，每个方向各有一个无界队列，
/// 单个方向内保持先进先出
#[derive(Debug)]
pub struct ControlChannel {
    sender: ControlSender,
    receiver: ControlReceiver,
}

/// 控制通道的发送半边
#[derive(Debug, Clone)]
pub struct ControlSender {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

/// 控制通道的接收半边
#[derive(Debug)]
pub struct ControlReceiver {
    rx: mpsc::UnboundedReceiver<ControlMessage>,
}

impl ControlChannel {
    /// 创建一对互相连接的通道端点
    pub fn pair() -> (ControlChannel, ControlChannel) {
        let (left_tx, left_rx) = mpsc::unbounded_channel();
        let (right_tx, right_rx) = mpsc::unbounded_channel();

        let left = ControlChannel {
            sender: ControlSender { tx: right_tx },
            receiver: ControlReceiver { rx: left_rx },
        };
        let right = ControlChannel {
            sender: ControlSender { tx: left_tx },
            receiver: ControlReceiver { rx: right_rx },
        };
        (left, right)
    }

    pub fn send(&self, message: ControlMessage) -> Result<(), ChannelClosed> {
        self.sender.send(message)
    }

    /// 等待下一条消息，对端关闭后返回 `None`
    pub async fn recv(&mut self) -> Option<ControlMessage> {
        self.receiver.recv().await
    }

    /// 非阻塞地取出一条已到达的消息
    pub fn try_recv(&mut self) -> Option<ControlMessage> {
        self.receiver.try_recv()
    }

    pub fn into_split(self) -> (ControlSender, ControlReceiver) {
        (self.sender, self.receiver)
    }
}

impl ControlSender {
    pub fn send(&self, message: ControlMessage) -> Result<(), ChannelClosed> {
        self.tx.send(message).map_err(|_| ChannelClosed)
    }
}

impl ControlReceiver {
    pub async fn recv(&mut self) -> Option<ControlMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ControlMessage> {
        self.rx.try_recv().ok()
    }

    /// 转换为消息流，用于在多个通道上同时等待
    pub fn into_stream(self) -> BoxStream<'static, ControlMessage> {
        let mut rx = self.rx;
        stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed()
    }
}
