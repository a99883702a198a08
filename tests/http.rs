//! HTTP transport and clubs API against a local mock server.

use clubs_notify::{
    api::{ClubsApi, CurrentUser, RequestStatus},
    auth::SessionToken,
    bus::LocalEventBus,
    config::StreamConfig,
    error::{ClubsError, StreamError},
    transport::{HttpTransport, Transport},
    types::ClubJoinEvent,
};
use futures::StreamExt;
use httpmock::Method::{DELETE, GET, POST};
use httpmock::MockServer;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use url::Url;

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).expect("http client should build")
}

fn api(server: &MockServer, token: Option<&str>, bus: LocalEventBus) -> ClubsApi {
    ClubsApi::new(
        reqwest::Client::new(),
        Url::parse(&server.base_url()).unwrap(),
        Arc::new(SessionToken::new(token.map(str::to_string))),
        bus,
    )
}

#[tokio::test]
async fn stream_request_carries_bearer_and_sse_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/clubs/notifications/stream")
                .header("authorization", "Bearer abc123")
                .header("accept", "text/event-stream")
                .header("cache-control", "no-cache");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body("data: {\"type\":\"connected\"}\n\ndata: {\"type\":\"club:user-joined\"}\n\n");
        })
        .await;

    let config = StreamConfig::new(&server.base_url()).unwrap();
    let mut stream = transport()
        .open(&config.stream_url, "abc123")
        .await
        .expect("stream should open");

    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend(chunk.expect("chunk should read"));
    }

    mock.assert_async().await;
    assert!(String::from_utf8(body).unwrap().contains("club:user-joined"));
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/clubs/notifications/stream");
            then.status(401);
        })
        .await;

    let config = StreamConfig::new(&server.base_url()).unwrap();
    let err = transport()
        .open(&config.stream_url, "expired")
        .await
        .err()
        .expect("401 should fail");

    assert_eq!(err, StreamError::AuthRejected { status: 401 });
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/clubs/notifications/stream");
            then.status(503);
        })
        .await;

    let config = StreamConfig::new(&server.base_url()).unwrap();
    let err = transport()
        .open(&config.stream_url, "token")
        .await
        .err()
        .expect("503 should fail");

    assert_eq!(err, StreamError::Http { status: 503 });
    assert!(err.is_retryable());
}

#[tokio::test]
async fn confirmed_join_is_published_locally() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/clubs/12/join")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "data": {"message": "joined"},
                "message": "Successfully joined the club",
                "status": 200
            }));
        })
        .await;

    let bus = LocalEventBus::new();
    let seen: Arc<Mutex<Vec<ClubJoinEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.on_club_join(move |e| sink.lock().push(e.clone()));

    let user = CurrentUser {
        id: 4,
        name: "Noa Levi".into(),
    };
    let response = api(&server, Some("tok"), bus)
        .join_club(12, Some(&user))
        .await
        .expect("join should succeed");

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!((seen[0].club_id, seen[0].user_id), (12, 4));
    assert_eq!(seen[0].user_name, "Noa Levi");
    assert!(seen[0].timestamp.is_some());
}

#[tokio::test]
async fn pending_join_request_is_not_published() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/clubs/3/join");
            then.status(201).json_body(json!({
                "data": {"request_status": "pending"},
                "message": "Join request sent",
                "status": 201
            }));
        })
        .await;

    let bus = LocalEventBus::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    bus.on_club_join(move |_| *counter.lock() += 1);

    let user = CurrentUser {
        id: 4,
        name: "Noa".into(),
    };
    let response = api(&server, Some("tok"), bus)
        .join_club(3, Some(&user))
        .await
        .unwrap();

    assert_eq!(
        response.data.and_then(|d| d.request_status),
        Some(RequestStatus::Pending)
    );
    assert_eq!(*calls.lock(), 0);
}

#[tokio::test]
async fn leave_passes_user_id_and_surfaces_api_errors() {
    let server = MockServer::start_async().await;
    let leave = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/clubs/5/leave")
                .query_param("user_id", "9");
            then.status(200)
                .json_body(json!({"message": "Member removed", "status": 200}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/clubs/5/accept-request/77");
            then.status(403).json_body(json!({"message": "Only admins can accept"}));
        })
        .await;

    let api = api(&server, Some("tok"), LocalEventBus::new());

    let response = api.leave_club(5, Some(9)).await.unwrap();
    leave.assert_async().await;
    assert_eq!(response.message, "Member removed");

    match api.accept_request(5, 77).await {
        Err(ClubsError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Only admins can accept");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_membership_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/clubs/1/join");
            then.status(401);
        })
        .await;

    let result = api(&server, None, LocalEventBus::new()).join_club(1, None).await;
    assert!(matches!(result, Err(ClubsError::Unauthorized)));
}
