// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含领域消息、采集条目模型以及仓库和消息总线接口
pub mod domain;

/// 引擎模块
///
/// 实现外部数据源客户端
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、Redis 和指标导出
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型和日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现抓取器编排、工作进程管理和检索循环
pub mod workers;
