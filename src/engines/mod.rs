// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据源模块
///
/// 定义数据源特质并提供 Reddit API 客户端实现
pub mod reddit_api;
pub mod traits;
