//! Message fan-out and client-side delivery dedup

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use skillshare_chat::client::ChatSession;
use skillshare_chat::domain::ConversationId;

use crate::common::{json_body, TestApp};

fn join_frame(conversation: &ConversationId, other: uuid::Uuid) -> serde_json::Value {
    json!({
        "event": "join_conversation",
        "data": { "conversationId": conversation, "otherUserId": other },
    })
}

#[tokio::test]
async fn viewer_gets_two_frames_but_renders_one_message() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut bob_client = app.connect(&bob).await;
    app.send_frame(&mut bob_client, join_frame(&conversation, ada.id))
        .await;
    bob_client.drain();

    let body = json!({ "receiverId": bob.id, "content": "Lesson notes attached" });
    let (status, _) =
        json_body(app.post_json_auth("/api/v1/messages", &body, &app.token_for(&ada)).await).await;
    assert_eq!(status, StatusCode::CREATED);

    let frames = bob_client.drain_named("new_message");
    assert_eq!(frames.len(), 2);

    let mut chat = ChatSession::new(bob.id, Duration::from_secs(60));
    let now = Instant::now();
    let rendered = frames
        .into_iter()
        .filter(|frame| chat.apply(frame.clone(), now))
        .count();

    assert_eq!(rendered, 1);
    assert_eq!(chat.timeline(&conversation).len(), 1);
}

#[tokio::test]
async fn receiver_elsewhere_still_gets_personal_delivery() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut bob_client = app.connect(&bob).await;
    bob_client.drain();

    let body = json!({ "receiverId": bob.id, "content": "Ping" });
    app.post_json_auth("/api/v1/messages", &body, &app.token_for(&ada))
        .await;

    assert_eq!(bob_client.drain_named("new_message").len(), 1);
}

#[tokio::test]
async fn deduplicated_submission_is_not_delivered_again() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let token = app.token_for(&ada);
    let mut bob_client = app.connect(&bob).await;
    bob_client.drain();

    let body = json!({ "receiverId": bob.id, "content": "Ping", "clientMessageId": "tok-9" });
    app.post_json_auth("/api/v1/messages", &body, &token).await;
    assert_eq!(bob_client.drain_named("new_message").len(), 1);

    let (status, _) = json_body(app.post_json_auth("/api/v1/messages", &body, &token).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bob_client.drain_named("new_message").is_empty());
}

#[tokio::test]
async fn sender_viewing_conversation_sees_own_message() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut ada_client = app.connect(&ada).await;
    app.send_frame(&mut ada_client, join_frame(&conversation, bob.id))
        .await;
    ada_client.drain();

    let body = json!({ "receiverId": bob.id, "content": "Echo" });
    app.post_json_auth("/api/v1/messages", &body, &app.token_for(&ada))
        .await;

    assert_eq!(ada_client.drain_named("new_message").len(), 1);
}
