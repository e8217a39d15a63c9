//! HTTP API tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use skillshare_chat::domain::ConversationId;

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn health_reports_connections() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let _session = app.connect(&ada).await;

    let (status, body) = json_body(app.get("/health").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_connections"], 1);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let app = TestApp::new();
    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[test_case(None ; "missing token")]
#[test_case(Some("not-a-jwt") ; "garbage token")]
#[tokio::test]
async fn gateway_refuses_bad_credentials(token: Option<&str>) {
    let app = TestApp::new();
    let uri = match token {
        Some(token) => format!("/gateway?token={}", token),
        None => "/gateway".to_string(),
    };

    let (status, body) = json_body(app.get(&uri).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 10003);
    assert_eq!(app.state.gateway.session_count(), 0);
}

#[tokio::test]
async fn gateway_refuses_token_for_unknown_user() {
    let app = TestApp::new();
    let token = app.state.auth.issue_token(uuid::Uuid::new_v4()).unwrap();

    let response = app.get_auth("/gateway", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gateway_accepts_valid_token_before_upgrade_check() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let token = app.token_for(&ada);

    // No upgrade headers: authentication passes, the upgrade itself is refused.
    let response = app.get(&format!("/gateway?token={}", token)).await;
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = TestApp::new();
    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/v1/messages")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resubmitted_token_returns_original_message() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let token = app.token_for(&ada);
    let body = json!({
        "receiverId": bob.id,
        "content": "Can we move the lesson to Friday?",
        "clientMessageId": "ada-001",
    });

    let (first_status, first) =
        json_body(app.post_json_auth("/api/v1/messages", &body, &token).await).await;
    let (second_status, second) =
        json_body(app.post_json_auth("/api/v1/messages", &body, &token).await).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(app.messages.len(), 1);
}

#[tokio::test]
async fn identical_content_within_window_is_deduplicated() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let token = app.token_for(&ada);
    let body = json!({ "receiverId": bob.id, "content": "See you at 5" });

    let (_, first) = json_body(app.post_json_auth("/api/v1/messages", &body, &token).await).await;
    let (status, second) =
        json_body(app.post_json_auth("/api/v1/messages", &body, &token).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(app.messages.len(), 1);
}

#[test_case(json!({ "content": "" }), StatusCode::BAD_REQUEST ; "empty message")]
#[test_case(json!({ "content": "x".repeat(2001) }), StatusCode::BAD_REQUEST ; "too long")]
#[tokio::test]
async fn invalid_messages_are_rejected(extra: serde_json::Value, expected: StatusCode) {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut body = json!({ "receiverId": bob.id });
    body["content"] = extra["content"].clone();

    let response = app
        .post_json_auth("/api/v1/messages", &body, &app.token_for(&ada))
        .await;
    assert_eq!(response.status(), expected);
    assert!(app.messages.is_empty());
}

#[tokio::test]
async fn unknown_receiver_is_not_found() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let body = json!({ "receiverId": uuid::Uuid::new_v4(), "content": "hello?" });

    let response = app
        .post_json_auth("/api/v1/messages", &body, &app.token_for(&ada))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_is_sorted_and_participant_only() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let eve = app.create_user("Eve");
    let token = app.token_for(&ada);

    for content in ["first", "second", "third"] {
        let body = json!({ "receiverId": bob.id, "content": content });
        app.post_json_auth("/api/v1/messages", &body, &token).await;
    }

    let uri = format!(
        "/api/v1/conversations/{}/messages",
        ConversationId::between(ada.id, bob.id)
    );

    let (status, body) = json_body(app.get_auth(&uri, &app.token_for(&bob)).await).await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let response = app.get_auth(&uri, &app.token_for(&eve)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_conversation_id_is_bad_request() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");

    let response = app
        .get_auth(
            "/api/v1/conversations/not-a-conversation/messages",
            &app.token_for(&ada),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn presence_endpoint_reflects_live_state() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let uri = format!("/api/v1/users/{}/presence", bob.id);
    let token = app.token_for(&ada);

    let (_, before) = json_body(app.get_auth(&uri, &token).await).await;
    assert_eq!(before["isOnline"], false);

    let session = app.connect(&bob).await;
    let (_, during) = json_body(app.get_auth(&uri, &token).await).await;
    assert_eq!(during["isOnline"], true);
    assert_eq!(during["userId"], bob.id.to_string());

    app.disconnect(&session).await;
    let (_, after) = json_body(app.get_auth(&uri, &token).await).await;
    assert_eq!(after["isOnline"], false);
    assert!(after["lastSeen"].is_string());
}
