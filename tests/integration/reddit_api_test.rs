// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use stockwatch_ingest::domain::models::reddit_submission::Edited;
use stockwatch_ingest::engines::reddit_api::RedditApiClient;
use stockwatch_ingest::engines::traits::{ItemSource, SourceError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{complete_profile, reddit_settings};

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "*"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> RedditApiClient {
    RedditApiClient::new(
        &reddit_settings(Some(complete_profile()), &server.uri()),
        complete_profile(),
    )
    .unwrap()
}

fn listing(children: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "Listing", "data": { "after": null, "children": children } })
}

#[tokio::test]
async fn test_followed_sources_lists_subscriptions() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/subreddits/mine/subscriber"))
        .and(header("authorization", "Bearer tok-123"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
            { "kind": "t5", "data": { "display_name": "stocks" } },
            { "kind": "t5", "data": { "display_name": "investing" } }
        ]))))
        .mount(&server)
        .await;

    let sources = client(&server).followed_sources().await.unwrap();

    assert_eq!(sources, vec!["stocks".to_string(), "investing".to_string()]);
}

#[tokio::test]
async fn test_newest_items_parses_submissions_and_reuses_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
            {
                "kind": "t3",
                "data": {
                    "id": "abc",
                    "name": "t3_abc",
                    "title": "Earnings beat",
                    "author": "analyst",
                    "subreddit": "stocks",
                    "selftext": "numbers inside",
                    "url": "https://example.com/abc",
                    "permalink": "/r/stocks/comments/abc/",
                    "score": 10,
                    "num_comments": 2,
                    "created_utc": 1700000000.0,
                    "edited": false,
                    "over_18": false,
                    "ups": 10
                }
            },
            {
                "kind": "t3",
                "data": {
                    "id": "def",
                    "name": "t3_def",
                    "title": "Guidance cut",
                    "author": null,
                    "subreddit": "stocks",
                    "created_utc": 1700000100.0,
                    "edited": 1700000200.0
                }
            }
        ]))))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.newest_items("stocks", 10).await.unwrap();
    let second = client.newest_items("stocks", 10).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].name, "t3_abc");
    assert_eq!(first[0].edited, Edited::Flag(false));
    assert_eq!(first[1].author, None);
    assert_eq!(first[1].edited, Edited::At(1_700_000_200.0));
}

#[tokio::test]
async fn test_malformed_child_is_skipped_without_losing_the_listing() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
            {
                "kind": "t3",
                "data": {
                    "id": "good",
                    "name": "t3_good",
                    "title": "Buyback announced",
                    "subreddit": "stocks",
                    "created_utc": 1700000000.0,
                    "edited": false
                }
            },
            {
                "kind": "t3",
                "data": {
                    "id": "untitled",
                    "name": "t3_untitled",
                    "subreddit": "stocks",
                    "created_utc": 1700000050.0
                }
            },
            {
                "kind": "t3",
                "data": {
                    "id": "odd",
                    "name": "t3_odd",
                    "title": "Weird edit marker",
                    "subreddit": "stocks",
                    "created_utc": 1700000060.0,
                    "edited": "yesterday"
                }
            }
        ]))))
        .mount(&server)
        .await;

    let items = client(&server).newest_items("stocks", 10).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "t3_good");
}

#[tokio::test]
async fn test_rejected_credentials_are_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).followed_sources().await.unwrap_err();

    assert!(matches!(err, SourceError::Authentication(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).newest_items("stocks", 10).await.unwrap_err();

    assert!(matches!(err, SourceError::Request(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_revoked_token_is_refreshed_on_next_call() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([]))))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.newest_items("stocks", 10).await.unwrap_err();
    assert!(matches!(err, SourceError::Authentication(_)));

    let items = client.newest_items("stocks", 10).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_malformed_listing_is_unexpected_response() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).newest_items("stocks", 10).await.unwrap_err();

    assert!(matches!(err, SourceError::UnexpectedResponse(_)));
}
