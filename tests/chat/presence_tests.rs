//! Presence lifecycle tests

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use skillshare_chat::domain::{ChatEvent, UserRepository};

use crate::common::TestApp;

fn heartbeat() -> serde_json::Value {
    json!({ "event": "heartbeat" })
}

#[tokio::test]
async fn connect_sends_ready_and_broadcasts_online() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");

    let mut observer = app.connect(&ada).await;
    observer.drain();
    let mut bob_client = app.connect(&bob).await;

    let ready = bob_client.drain_named("ready");
    assert!(matches!(
        &ready[..],
        [ChatEvent::Ready(p)] if p.user_id == bob.id && p.heartbeat_interval_ms == 25_000
    ));

    let online = observer.drain_named("user_online");
    assert!(matches!(&online[..], [ChatEvent::UserOnline(p)] if p.user_id == bob.id));

    let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
    assert!(stored.is_online);
}

#[tokio::test]
async fn heartbeat_then_sweep_keeps_user_online() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut observer = app.connect(&ada).await;
    let mut bob_client = app.connect(&bob).await;
    observer.drain();

    app.send_frame(&mut bob_client, heartbeat()).await;
    assert_eq!(bob_client.drain_named("heartbeat_ack").len(), 1);

    let evicted = app.state.presence.sweep(Utc::now()).await;
    assert!(evicted.is_empty());
    assert!(app.state.presence.is_online(bob.id));
    assert!(observer.drain_named("user_offline").is_empty());
}

#[tokio::test]
async fn stale_user_goes_offline_exactly_once() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut observer = app.connect(&ada).await;
    let bob_client = app.connect(&bob).await;
    observer.drain();

    let last_heartbeat = app.state.presence.last_heartbeat(bob.id).unwrap();
    let later = Utc::now() + Duration::seconds(61);

    let evicted = app.state.presence.sweep(later).await;
    assert!(evicted.contains(&bob.id));
    assert!(app.state.presence.sweep(later).await.is_empty());

    // The stale socket closing afterwards is not a second transition.
    app.disconnect(&bob_client).await;

    let offline: Vec<ChatEvent> = observer
        .drain_named("user_offline")
        .into_iter()
        .filter(|e| matches!(e, ChatEvent::UserOffline(p) if p.user_id == bob.id))
        .collect();
    assert_eq!(offline.len(), 1);
    assert!(matches!(&offline[0], ChatEvent::UserOffline(p) if p.last_seen == last_heartbeat));

    let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
    assert!(!stored.is_online);
    assert_eq!(stored.last_seen, Some(last_heartbeat));
}

#[tokio::test]
async fn heartbeat_after_eviction_reconciles() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut observer = app.connect(&ada).await;
    let mut bob_client = app.connect(&bob).await;

    app.state
        .presence
        .sweep(Utc::now() + Duration::seconds(61))
        .await;
    assert!(!app.state.gateway.is_connected(bob.id));
    observer.drain();
    bob_client.drain();

    app.send_frame(&mut bob_client, heartbeat()).await;

    assert!(app.state.presence.is_online(bob.id));
    assert_eq!(
        app.state.gateway.connection(bob.id).unwrap().session_id,
        bob_client.session.session_id
    );
    assert_eq!(observer.drain_named("user_online").len(), 1);
    assert_eq!(bob_client.drain_named("heartbeat_ack").len(), 1);
}

#[tokio::test]
async fn sweep_keeps_connection_opened_after_stale_heartbeat() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut observer = app.connect(&ada).await;
    let bob_client = app.connect(&bob).await;

    // Last heartbeat predates the current connection.
    let stale = Utc::now() - Duration::seconds(120);
    app.state.presence.heartbeat(bob.id, stale).await;
    observer.drain();

    let evicted = app.state.presence.sweep(Utc::now()).await;
    assert_eq!(evicted, vec![bob.id]);
    assert_eq!(
        app.state.gateway.connection(bob.id).unwrap().session_id,
        bob_client.session.session_id
    );
    assert_eq!(observer.drain_named("user_offline").len(), 1);

    // The live session still owns its record, so closing it is observed.
    app.disconnect(&bob_client).await;
    assert!(!app.state.gateway.is_connected(bob.id));
    let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
    assert!(!stored.is_online);
    assert!(stored.last_seen.unwrap() > stale);
}

#[tokio::test]
async fn reconnect_survives_stale_session_close() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let bob = app.create_user("Bob");
    let mut observer = app.connect(&ada).await;

    let first = app.connect(&bob).await;
    let second = app.connect(&bob).await;
    observer.drain();

    app.disconnect(&first).await;
    assert!(app.state.presence.is_online(bob.id));
    assert!(observer.drain_named("user_offline").is_empty());

    app.disconnect(&second).await;
    assert!(!app.state.presence.is_online(bob.id));
    assert_eq!(observer.drain_named("user_offline").len(), 1);
}

#[tokio::test]
async fn malformed_frames_get_error_event() {
    let app = TestApp::new();
    let ada = app.create_user("Ada");
    let mut client = app.connect(&ada).await;
    client.drain();

    app.send_frame(&mut client, json!({ "event": "typing", "data": { "isTyping": true } }))
        .await;
    app.send_frame(&mut client, json!({ "event": "shutdown" })).await;

    assert_eq!(client.drain_named("error").len(), 2);
    assert!(app.state.gateway.is_connected(ada.id));
}
