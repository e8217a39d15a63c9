//! Common Test Utilities
//!
//! In-memory application state, token helpers and a socket-less session
//! driver that runs the same code paths as the gateway handler.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use skillshare_chat::config::{
    CorsSettings, DatabaseSettings, DedupSettings, JwtSettings, PresenceSettings, ServerSettings,
    Settings, WebSocketSettings,
};
use skillshare_chat::domain::{ChatEvent, User};
use skillshare_chat::infrastructure::repositories::{
    InMemoryMessageRepository, InMemoryUserRepository,
};
use skillshare_chat::presentation::websocket::{self, SessionState};
use skillshare_chat::startup::{build_router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret-with-32-plus-bytes";

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 1,
            run_migrations: false,
        },
        jwt: JwtSettings {
            secret: TEST_SECRET.into(),
            access_token_expiry_minutes: 60,
        },
        presence: PresenceSettings {
            heartbeat_interval_ms: 25_000,
            liveness_threshold_ms: 60_000,
            sweep_interval_ms: 30_000,
        },
        dedup: DedupSettings {
            send_window_secs: 10,
            delivery_window_secs: 60,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        websocket: WebSocketSettings {
            max_message_size: 65536,
        },
        environment: "test".into(),
    }
}

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let state = AppState::new(test_settings(), users.clone(), messages.clone());

        Self {
            router: build_router(state.clone()),
            state,
            users,
            messages,
        }
    }

    pub fn create_user(&self, name: &str) -> User {
        let user = User::new(
            name,
            format!("{}_{}@example.com", name.to_lowercase(), Uuid::new_v4()),
        );
        self.users.insert(user.clone());
        user
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.auth.issue_token(user.id).unwrap()
    }

    /// Open a gateway session without a socket.
    pub async fn connect(&self, user: &User) -> TestSession {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = websocket::open_session(&self.state, user, Uuid::new_v4(), tx).await;
        TestSession { session, rx }
    }

    /// Send a client frame on behalf of a session.
    pub async fn send_frame(&self, client: &mut TestSession, frame: Value) {
        websocket::process_frame(&frame.to_string(), &mut client.session, &self.state).await;
    }

    pub async fn disconnect(&self, client: &TestSession) {
        websocket::close_session(&self.state, client.session.session_id).await;
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, uri: &str, token: &str) -> Response {
        self.request(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post_json_auth(&self, uri: &str, body: &Value, token: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// A connected session and the frames queued for it.
pub struct TestSession {
    pub session: SessionState,
    pub rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl TestSession {
    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Queued events with the given wire name.
    pub fn drain_named(&mut self, name: &str) -> Vec<ChatEvent> {
        self.drain()
            .into_iter()
            .filter(|e| e.name() == name)
            .collect()
    }
}

pub async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
