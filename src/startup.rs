//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::application::services::{
    AuthService, MessageService, MessageServiceImpl, PresenceTracker, ReadReceiptService,
};
use crate::config::Settings;
use crate::domain::{MessageRepository, RealtimeHub, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    InMemoryMessageRepository, InMemoryUserRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub auth: Arc<AuthService>,
    pub message_service: Arc<dyn MessageService>,
    pub presence: Arc<PresenceTracker>,
    pub read_receipts: Arc<ReadReceiptService>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the services around the given stores.
    pub fn new(
        settings: Settings,
        users: Arc<dyn UserRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        let gateway = Arc::new(Gateway::new(settings.presence.heartbeat_interval_ms));
        let hub: Arc<dyn RealtimeHub> = gateway.clone();

        let auth = Arc::new(AuthService::new(users.clone(), settings.jwt.clone()));
        let message_service: Arc<dyn MessageService> = Arc::new(MessageServiceImpl::new(
            messages.clone(),
            users.clone(),
            hub.clone(),
            settings.dedup.send_window(),
        ));
        let presence = Arc::new(PresenceTracker::new(
            settings.presence.liveness_threshold(),
            users.clone(),
            hub.clone(),
        ));
        let read_receipts = Arc::new(ReadReceiptService::new(messages.clone(), hub));

        Self {
            users,
            messages,
            auth,
            message_service,
            presence,
            read_receipts,
            gateway,
            settings: Arc::new(settings),
        }
    }

    /// State backed by the in-memory stores.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(
            settings,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        )
    }
}

/// Router with the standard middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    sweeper: JoinHandle<()>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let state = match settings.database.url.clone() {
            Some(url) => {
                let db = database::create_pool(&settings.database, &url).await?;
                tracing::info!("Database connection pool created");

                if settings.database.run_migrations {
                    database::run_migrations(&db).await?;
                    tracing::info!("Database migrations applied");
                }

                AppState::new(
                    settings.clone(),
                    Arc::new(PgUserRepository::new(db.clone())),
                    Arc::new(PgMessageRepository::new(db)),
                )
            }
            None => {
                tracing::warn!("No database URL configured, using in-memory stores");
                AppState::in_memory(settings.clone())
            }
        };

        let sweeper = state
            .presence
            .clone()
            .spawn_sweeper(settings.presence.sweep_interval());
        tracing::info!(
            sweep_interval_ms = settings.presence.sweep_interval_ms,
            liveness_threshold_ms = settings.presence.liveness_threshold_ms,
            "Presence sweeper started"
        );

        let router = build_router(state);

        // Bind to address
        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            sweeper,
        })
    }

    /// Run the server until ctrl-c
    pub async fn run_until_stopped(self) -> Result<()> {
        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.sweeper.abort();
        tracing::info!("Server stopped");

        result.map_err(Into::into)
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
