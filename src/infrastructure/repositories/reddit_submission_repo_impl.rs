// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatabaseSettings;
use crate::domain::models::message::Payload;
use crate::domain::repositories::item_repository::{ItemRepository, ItemRepositoryProvider};
use crate::infrastructure::database::connection;
use crate::infrastructure::database::entities::reddit_submission as submission_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use serde_json::Value;
use std::sync::Arc;

/// Reddit 帖子仓库实现
pub struct RedditSubmissionRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl RedditSubmissionRepositoryImpl {
    /// 创建新的帖子仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for RedditSubmissionRepositoryImpl {
    async fn count_by_id(&self, id: &str) -> Result<u64, RepositoryError> {
        let count = submission_entity::Entity::find()
            .filter(submission_entity::Column::Id.eq(id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn insert(&self, payload: &Payload) -> Result<(), RepositoryError> {
        // Payload keys map 1:1 onto the table columns.
        let model: submission_entity::Model =
            serde_json::from_value(Value::Object(payload.clone()))
                .map_err(|e| RepositoryError::InvalidParameter(e.to_string()))?;

        let txn = self.db.begin().await?;
        submission_entity::Entity::insert(model.into_active_model())
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payload>, RepositoryError> {
        let model = submission_entity::Entity::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await?;

        match model {
            Some(m) => match serde_json::to_value(m) {
                Ok(Value::Object(payload)) => Ok(Some(payload)),
                Ok(_) => Err(RepositoryError::InternalError(
                    "row did not serialize to an object".to_string(),
                )),
                Err(e) => Err(RepositoryError::InternalError(e.to_string())),
            },
            None => Ok(None),
        }
    }
}

/// 基于数据库配置的仓库提供者
///
/// 每次调用 `connect` 都会打开一个新的连接池，供单个工作进程独占使用
pub struct DatabaseRepositoryProvider {
    settings: DatabaseSettings,
}

impl DatabaseRepositoryProvider {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ItemRepositoryProvider for DatabaseRepositoryProvider {
    async fn connect(&self) -> Result<Arc<dyn ItemRepository>, RepositoryError> {
        let db = connection::create_pool(&self.settings).await?;
        Ok(Arc::new(RedditSubmissionRepositoryImpl::new(Arc::new(db))))
    }
}
