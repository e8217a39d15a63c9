//! Room routing tests

use pretty_assertions::assert_eq;
use serde_json::json;

use skillshare_chat::domain::{ChatEvent, ConversationId, RealtimeHub, Room};

use crate::common::TestApp;

fn join(conversation: &ConversationId, other: uuid::Uuid) -> serde_json::Value {
    json!({
        "event": "join_conversation",
        "data": { "conversationId": conversation, "otherUserId": other },
    })
}

#[tokio::test]
async fn switching_conversations_leaves_the_old_room() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let cat = app.create_user("Cat");
    let first = ConversationId::between(ada.id, bob.id);
    let second = ConversationId::between(ada.id, cat.id);

    let mut ada_client = app.connect(&ada).await;
    app.send_frame(&mut ada_client, join(&first, bob.id)).await;
    app.send_frame(&mut ada_client, join(&second, cat.id)).await;
    ada_client.drain();

    let session = ada_client.session.session_id;
    let mut rooms = app.state.gateway.rooms().rooms_of(session);
    rooms.sort_by_key(|r| r.is_personal());
    assert_eq!(
        rooms,
        vec![Room::Conversation(second.clone()), Room::Personal(ada.id)]
    );

    app.state
        .gateway
        .emit_to(&Room::Conversation(first), ChatEvent::error("old room"));
    assert!(ada_client.drain().is_empty());

    app.state
        .gateway
        .notify_user(ada.id, ChatEvent::Notification(json!({ "kind": "booking" })));
    assert_eq!(ada_client.drain_named("notification").len(), 1);
}

#[tokio::test]
async fn joining_notifies_the_other_viewer() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut bob_client = app.connect(&bob).await;
    app.send_frame(&mut bob_client, join(&conversation, ada.id)).await;
    let mut ada_client = app.connect(&ada).await;
    bob_client.drain();

    app.send_frame(&mut ada_client, join(&conversation, bob.id)).await;

    let joined = bob_client.drain_named("user_joined_conversation");
    assert!(matches!(
        &joined[..],
        [ChatEvent::UserJoinedConversation(p)] if p.user.id == ada.id && p.conversation_id == conversation
    ));
    assert!(ada_client.drain_named("user_joined_conversation").is_empty());
}

#[tokio::test]
async fn rejoining_the_viewed_conversation_is_silent() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut bob_client = app.connect(&bob).await;
    app.send_frame(&mut bob_client, join(&conversation, ada.id)).await;
    let mut ada_client = app.connect(&ada).await;
    bob_client.drain();

    app.send_frame(&mut ada_client, join(&conversation, bob.id)).await;
    app.send_frame(&mut ada_client, join(&conversation, bob.id)).await;

    assert!(ada_client.session.is_viewing(&conversation));
    assert_eq!(bob_client.drain_named("user_joined_conversation").len(), 1);
    assert!(ada_client.drain_named("error").is_empty());
}

#[tokio::test]
async fn foreign_conversation_is_refused() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let cat = app.create_user("Cat");
    let foreign = ConversationId::between(bob.id, cat.id);

    let mut ada_client = app.connect(&ada).await;
    ada_client.drain();
    app.send_frame(&mut ada_client, join(&foreign, bob.id)).await;

    assert_eq!(ada_client.drain_named("error").len(), 1);
    assert_eq!(
        app.state.gateway.rooms().rooms_of(ada_client.session.session_id),
        vec![Room::Personal(ada.id)]
    );
}

#[tokio::test]
async fn mismatched_other_user_is_refused() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut ada_client = app.connect(&ada).await;
    ada_client.drain();
    app.send_frame(&mut ada_client, join(&conversation, ada.id)).await;

    assert_eq!(ada_client.drain_named("error").len(), 1);
}

#[tokio::test]
async fn typing_reaches_the_other_viewer_only() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let conversation = ConversationId::between(ada.id, bob.id);

    let mut ada_client = app.connect(&ada).await;
    let mut bob_client = app.connect(&bob).await;
    app.send_frame(&mut ada_client, join(&conversation, bob.id)).await;
    app.send_frame(&mut bob_client, join(&conversation, ada.id)).await;
    ada_client.drain();
    bob_client.drain();

    app.send_frame(
        &mut ada_client,
        json!({
            "event": "typing",
            "data": { "conversationId": conversation, "isTyping": true },
        }),
    )
    .await;

    let typing = bob_client.drain_named("user_typing");
    assert!(matches!(
        &typing[..],
        [ChatEvent::UserTyping(p)] if p.user_id == ada.id && p.user_name == "Ada" && p.is_typing
    ));
    assert!(ada_client.drain().is_empty());
}
