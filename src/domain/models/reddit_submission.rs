// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{DomainMessage, Payload};
use crate::engines::traits::SourceItem;
use crate::utils::errors::MessageConstructionError;

/// Reddit 帖子消息的主题标签
pub const REDDIT_SUBMISSION_HEADER: &str = "reddit_submission";

/// 编辑状态
///
/// 未编辑时 Reddit 返回 `false`，编辑后返回编辑时间戳
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Edited {
    Flag(bool),
    At(f64),
}

impl Default for Edited {
    fn default() -> Self {
        Edited::Flag(false)
    }
}

/// Reddit 帖子
///
/// 从列表接口解析出的规范化表示，字段与 `reddit_submissions` 表的列一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditSubmission {
    /// 帖子ID（不含类型前缀）
    pub id: String,
    /// 全名，例如 `t3_abc123`，作为去重标识
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub subreddit: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    pub created_utc: f64,
    #[serde(default)]
    pub edited: Edited,
    #[serde(default)]
    pub over_18: bool,
}

/// 将可变类型的 `edited` 字段规范化为可入库的值
///
/// 布尔值替换为 `null`，时间戳保持不变
pub fn normalize_edited(payload: &mut Payload) {
    if let Some(edited) = payload.get_mut("edited") {
        if edited.is_boolean() {
            *edited = Value::Null;
        }
    }
}

impl SourceItem for RedditSubmission {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_message(&self) -> Result<DomainMessage, MessageConstructionError> {
        DomainMessage::from_model(REDDIT_SUBMISSION_HEADER, self)
    }

    fn normalize_for_store(&self, payload: &mut Payload) {
        normalize_edited(payload);
    }
}
