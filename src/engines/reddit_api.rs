// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::counter;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

use crate::config::settings::{RedditProfile, RedditSettings};
use crate::domain::models::reddit_submission::RedditSubmission;
use crate::engines::traits::{ItemSource, SourceError};
use crate::utils::errors::MessageConstructionError;

/// 令牌提前刷新的余量
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// 订阅版块单页数量
const SUBSCRIPTION_PAGE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

/// 列表中的单个条目，`data` 逐个解码以便跳过格式不符的条目
#[derive(Debug, Deserialize)]
struct Thing {
    #[serde(default)]
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct Subreddit {
    display_name: String,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Reddit API 客户端
///
/// 使用凭据档案通过密码授权获取 OAuth 令牌，列出账号订阅的版块并拉取各版块的最新帖子。
/// 不处理分页和限流。
pub struct RedditApiClient {
    client: Client,
    profile: RedditProfile,
    auth_base: Url,
    api_base: Url,
    token: Mutex<Option<AccessToken>>,
}

impl RedditApiClient {
    /// 创建新的 Reddit 客户端
    ///
    /// # 参数
    ///
    /// * `settings` - Reddit 配置（服务地址和超时）
    /// * `profile` - 已通过校验的凭据档案
    pub fn new(settings: &RedditSettings, profile: RedditProfile) -> Result<Self, SourceError> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&profile.user_agent)
            .map_err(|e| SourceError::Authentication(format!("invalid user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            profile,
            auth_base: parse_base(&settings.auth_base_url)?,
            api_base: parse_base(&settings.api_base_url)?,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, SourceError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let url = self
            .auth_base
            .join("api/v1/access_token")
            .map_err(|e| SourceError::UnexpectedResponse(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.profile.client_id, Some(&self.profile.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.profile.username.as_str()),
                ("password", self.profile.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Authentication(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = response.error_for_status()?.json().await?;
        info!(expires_in = token.expires_in, "obtained reddit access token");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let value = token.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: usize,
    ) -> Result<Vec<T>, SourceError> {
        let token = self.access_token().await?;
        let url = self
            .api_base
            .join(path)
            .map_err(|e| SourceError::UnexpectedResponse(e.to_string()))?;

        debug!(%url, limit, "fetching reddit listing");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Token was revoked server side; force a refresh next time.
            self.token.lock().await.take();
            return Err(SourceError::Authentication("access token rejected".to_string()));
        }

        let listing: Listing = response
            .error_for_status()?
            .json()
            .await
            .map_err(|e| SourceError::UnexpectedResponse(e.to_string()))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| decode_child(path, thing))
            .collect())
    }
}

fn decode_child<T: DeserializeOwned>(path: &str, thing: Thing) -> Option<T> {
    let name = thing
        .data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(thing.kind.as_str())
        .to_string();

    match serde_json::from_value(thing.data) {
        Ok(item) => Some(item),
        Err(e) => {
            let e = MessageConstructionError::from(e);
            counter!(
                "scraper_items_skipped_total",
                "scraper" => "reddit",
                "reason" => "construction"
            )
            .increment(1);
            error!(listing = %path, item = %name, error = %e, "Skipping malformed listing entry");
            None
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, SourceError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| SourceError::UnexpectedResponse(format!("invalid base url '{}': {}", raw, e)))
}

#[async_trait]
impl ItemSource for RedditApiClient {
    type Item = RedditSubmission;

    async fn followed_sources(&self) -> Result<Vec<String>, SourceError> {
        let subreddits: Vec<Subreddit> = self
            .get_listing("subreddits/mine/subscriber", SUBSCRIPTION_PAGE_LIMIT)
            .await?;
        Ok(subreddits.into_iter().map(|s| s.display_name).collect())
    }

    async fn newest_items(
        &self,
        source: &str,
        limit: usize,
    ) -> Result<Vec<RedditSubmission>, SourceError> {
        self.get_listing(&format!("r/{}/new", source), limit).await
    }
}
