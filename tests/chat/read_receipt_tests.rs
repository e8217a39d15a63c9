//! Read receipt tests

use axum::http::StatusCode;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;

use skillshare_chat::domain::{ChatEvent, ConversationId, MessageRepository};

use crate::common::{json_body, TestApp};

async fn send(app: &TestApp, from: &skillshare_chat::domain::User, to: uuid::Uuid, content: &str) {
    let body = json!({ "receiverId": to, "content": content });
    let response = app
        .post_json_auth("/api/v1/messages", &body, &app.token_for(from))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn reading_three_messages_sends_one_receipt() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    for content in ["one", "two", "three"] {
        send(&app, &ada, bob.id, content).await;
    }

    let mut ada_client = app.connect(&ada).await;
    let mut bob_client = app.connect(&bob).await;
    ada_client.drain();

    app.send_frame(
        &mut bob_client,
        json!({
            "event": "message_read",
            "data": { "conversationId": conversation, "readerId": bob.id },
        }),
    )
    .await;

    let receipts = ada_client.drain_named("messages_read");
    assert!(matches!(
        &receipts[..],
        [ChatEvent::MessagesRead(p)] if p.reader_id == bob.id && p.conversation_id == conversation
    ));

    let unread = app.messages.find_unread_for(&conversation, bob.id).await.unwrap();
    assert!(unread.is_empty());
    let history = app.messages.find_by_conversation(&conversation, 10).await.unwrap();
    assert!(history.iter().all(|m| m.is_read && m.read_at.is_some()));
}

#[tokio::test]
async fn repeat_mark_read_is_silent() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);
    send(&app, &ada, bob.id, "hello").await;

    let mut ada_client = app.connect(&ada).await;
    ada_client.drain();

    let first = app
        .state
        .read_receipts
        .mark_read(&conversation, bob.id, Utc::now())
        .await
        .unwrap();
    let second = app
        .state
        .read_receipts
        .mark_read(&conversation, bob.id, Utc::now())
        .await
        .unwrap();

    assert_eq!(first.marked, 1);
    assert_eq!(second.marked, 0);
    assert!(second.notified.is_empty());
    assert_eq!(ada_client.drain_named("messages_read").len(), 1);
}

#[tokio::test]
async fn reader_must_be_the_authenticated_user() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);
    send(&app, &ada, bob.id, "hello").await;

    let mut ada_client = app.connect(&ada).await;
    ada_client.drain();

    // Ada tries to mark Bob's inbox as read.
    app.send_frame(
        &mut ada_client,
        json!({
            "event": "message_read",
            "data": { "conversationId": conversation, "readerId": bob.id },
        }),
    )
    .await;

    assert_eq!(ada_client.drain_named("error").len(), 1);
    assert_eq!(
        app.messages.find_unread_for(&conversation, bob.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn mark_read_over_http() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);
    send(&app, &ada, bob.id, "one").await;
    send(&app, &ada, bob.id, "two").await;

    let uri = format!("/api/v1/conversations/{}/read", conversation);
    let (status, body) =
        json_body(app.post_json_auth(&uri, &json!({}), &app.token_for(&bob)).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], 2);
    assert_eq!(body["notified"], json!([ada.id]));
}
