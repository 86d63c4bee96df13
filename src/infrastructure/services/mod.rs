// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供消息总线的 Redis 实现和进程内实现
pub mod message_bus_impl;
