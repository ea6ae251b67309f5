//! HTTP-level tests of the live management API client

use cms_migrate::api::{HttpManagementApi, ManagementApi};
use cms_migrate::config::ApiSettings;
use cms_migrate::error::Error;
use cms_migrate::types::{
    BulkActionKind, BulkActionRequest, BulkActionStatus, Entry, EntryQuery,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

const ENV_PATH: &str = "/spaces/space1/environments/master";

fn api(server: &Server) -> HttpManagementApi {
    let settings = ApiSettings {
        base_url: server.url(),
        space_id: "space1".to_string(),
        environment_id: "master".to_string(),
        management_token: None,
    };
    HttpManagementApi::new(&settings, "secret-token").unwrap()
}

fn entry_body(id: &str, version: u64) -> String {
    json!({
        "sys": {
            "id": id,
            "version": version,
            "contentType": { "sys": { "id": "blogPost", "type": "Link", "linkType": "ContentType" } }
        },
        "fields": { "title": { "en-US": "Hello" } }
    })
    .to_string()
}

#[tokio::test]
async fn test_publish_sends_version_header_and_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", format!("{ENV_PATH}/entries/a/published").as_str())
        .match_header("authorization", "Bearer secret-token")
        .match_header("x-contentful-version", "4")
        .match_header(
            "content-type",
            "application/vnd.contentful.management.v1+json",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(entry_body("a", 5))
        .create_async()
        .await;

    let entry = api(&server).publish_entry("a", 4).await.unwrap();

    mock.assert_async().await;
    assert_eq!(entry.version(), 5);
}

#[tokio::test]
async fn test_unpublish_and_unarchive_use_delete() {
    let mut server = Server::new_async().await;
    let unpublish = server
        .mock("DELETE", format!("{ENV_PATH}/entries/a/published").as_str())
        .match_header("x-contentful-version", "5")
        .with_status(200)
        .with_body(entry_body("a", 6))
        .create_async()
        .await;
    let unarchive = server
        .mock("DELETE", format!("{ENV_PATH}/entries/a/archived").as_str())
        .match_header("x-contentful-version", "6")
        .with_status(200)
        .with_body(entry_body("a", 7))
        .create_async()
        .await;

    let client = api(&server);
    let after_unpublish = client.unpublish_entry("a", 5).await.unwrap();
    let after_unarchive = client
        .unarchive_entry("a", after_unpublish.version())
        .await
        .unwrap();

    unpublish.assert_async().await;
    unarchive.assert_async().await;
    assert_eq!(after_unarchive.version(), 7);
}

#[tokio::test]
async fn test_create_new_entry_posts_with_content_type_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", format!("{ENV_PATH}/entries").as_str())
        .match_header("x-contentful-content-type", "blogPost")
        .match_header("x-contentful-version", Matcher::Missing)
        .match_body(Matcher::PartialJson(
            json!({ "fields": { "title": { "en-US": "Hello" } } }),
        ))
        .with_status(201)
        .with_body(entry_body("new-id", 1))
        .create_async()
        .await;

    let mut entry = Entry::new("", "blogPost");
    entry
        .fields
        .insert("title".to_string(), json!({ "en-US": "Hello" }));
    let saved = api(&server).create_or_update_entry(&entry, 0).await.unwrap();

    mock.assert_async().await;
    assert_eq!(saved.id(), "new-id");
    assert_eq!(saved.version(), 1);
}

#[tokio::test]
async fn test_update_existing_entry_puts_with_version() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", format!("{ENV_PATH}/entries/a").as_str())
        .match_header("x-contentful-version", "3")
        .with_status(200)
        .with_body(entry_body("a", 4))
        .create_async()
        .await;

    let saved = api(&server)
        .create_or_update_entry(&Entry::new("a", "blogPost"), 3)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(saved.version(), 4);
}

#[tokio::test]
async fn test_version_mismatch_maps_to_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", format!("{ENV_PATH}/entries/a/published").as_str())
        .with_status(409)
        .with_body(
            json!({
                "sys": { "type": "Error", "id": "VersionMismatch" },
                "message": "version mismatch"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let error = api(&server).publish_entry("a", 1).await.unwrap_err();

    assert!(!error.is_transient());
    match error {
        Error::Api {
            status,
            error_id,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(error_id.as_deref(), Some("VersionMismatch"));
            assert_eq!(message, "version mismatch");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_hint() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("{ENV_PATH}/entries/a").as_str())
        .with_status(429)
        .with_header("x-contentful-ratelimit-reset", "2")
        .with_body(json!({ "sys": { "id": "RateLimitExceeded" } }).to_string())
        .create_async()
        .await;

    let error = api(&server).get_entry("a").await.unwrap_err();

    assert!(error.is_transient());
    assert_eq!(error.retry_after(), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", format!("{ENV_PATH}/entries/a").as_str())
        .with_status(502)
        .create_async()
        .await;

    let error = api(&server).delete_entry("a", 1).await.unwrap_err();

    assert!(matches!(error, Error::Api { status: 502, .. }));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_get_entries_sends_paging_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("{ENV_PATH}/entries").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), "100".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("content_type".into(), "blogPost".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "total": 101,
                "skip": 100,
                "limit": 100,
                "items": [serde_json::from_str::<serde_json::Value>(&entry_body("last", 2)).unwrap()]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let page = api(&server)
        .get_entries(&EntryQuery {
            content_type: Some("blogPost".to_string()),
            skip: 100,
            limit: 100,
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(page.total, 101);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id(), "last");
}

#[tokio::test]
async fn test_bulk_publish_body_and_status_poll() {
    let mut server = Server::new_async().await;
    let submit = server
        .mock("POST", format!("{ENV_PATH}/bulk_actions/publish").as_str())
        .match_body(Matcher::Json(json!({
            "entities": {
                "items": [
                    { "sys": { "id": "a", "version": 3, "type": "Link", "linkType": "Entry" } }
                ]
            }
        })))
        .with_status(201)
        .with_body(json!({ "sys": { "id": "act-1", "status": "created" }, "action": "publish" }).to_string())
        .create_async()
        .await;
    let poll = server
        .mock("GET", format!("{ENV_PATH}/bulk_actions/actions/act-1").as_str())
        .with_status(200)
        .with_body(
            json!({
                "sys": { "id": "act-1", "status": "failed" },
                "error": { "sys": { "id": "BulkActionFailed" }, "message": "entry a is invalid" }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut entry = Entry::new("a", "blogPost");
    entry.sys.version = 3;
    let client = api(&server);
    let request = BulkActionRequest::new(BulkActionKind::Publish, &[entry]);
    let created = client
        .create_bulk_action(BulkActionKind::Publish, &request)
        .await
        .unwrap();
    let polled = client.get_bulk_action(&created.sys.id).await.unwrap();

    submit.assert_async().await;
    poll.assert_async().await;
    assert_eq!(created.sys.status, BulkActionStatus::Created);
    assert_eq!(polled.sys.status, BulkActionStatus::Failed);
    assert_eq!(
        polled.error.and_then(|e| e.message).as_deref(),
        Some("entry a is invalid")
    );
}

#[tokio::test]
async fn test_bulk_unpublish_omits_versions() {
    let mut server = Server::new_async().await;
    let submit = server
        .mock("POST", format!("{ENV_PATH}/bulk_actions/unpublish").as_str())
        .match_body(Matcher::Json(json!({
            "entities": {
                "items": [
                    { "sys": { "id": "a", "type": "Link", "linkType": "Entry" } }
                ]
            }
        })))
        .with_status(201)
        .with_body(json!({ "sys": { "id": "act-2", "status": "inProgress" } }).to_string())
        .create_async()
        .await;

    let request = BulkActionRequest::new(
        BulkActionKind::Unpublish,
        &[Entry::new("a", "blogPost")],
    );
    let created = api(&server)
        .create_bulk_action(BulkActionKind::Unpublish, &request)
        .await
        .unwrap();

    submit.assert_async().await;
    assert_eq!(created.sys.status, BulkActionStatus::InProgress);
}
