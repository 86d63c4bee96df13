// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 消息（message）：领域消息、发布信封和总线频道
/// - Reddit 帖子（reddit_submission）：Reddit 数据源的规范化条目
pub mod message;
pub mod reddit_submission;
