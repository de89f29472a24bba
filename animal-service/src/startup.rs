//! Application startup and lifecycle management.

use crate::config::AnimalConfig;
use crate::handlers::{animals, health};
use crate::services::{seed, AnimalDb};
use axum::{
    body::Body,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    readiness::{readiness_gate_middleware, ReadinessGate},
    tracing::{make_request_span, request_id_middleware},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const HEALTH_PATH: &str = "/_service/health";
pub const METRICS_PATH: &str = "/_service/metrics";

/// Paths served while the database is down. Both have two segments so they
/// never collide with `/:name`.
pub const UNGATED_PATHS: [&str; 2] = [HEALTH_PATH, METRICS_PATH];

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AnimalConfig,
    pub db: AnimalDb,
    pub gate: ReadinessGate,
}

impl AppState {
    pub fn new(config: AnimalConfig, db: AnimalDb) -> Self {
        let gate = ReadinessGate {
            signal: db.readiness().clone(),
            excluded_paths: UNGATED_PATHS.iter().map(|p| p.to_string()).collect(),
        };
        Self { config, db, gate }
    }
}

impl AsRef<ReadinessGate> for AppState {
    fn as_ref(&self) -> &ReadinessGate {
        &self.gate
    }
}

/// Build the HTTP router.
///
/// Static segments win over `/:name` in axum's router whatever the
/// registration order; `/animals/cats` is still registered first.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();
    if state.config.breeds_enabled {
        router = router.route("/animals/cats", get(animals::list_cats));
    }

    router
        .route(HEALTH_PATH, get(health::health_check))
        .route(METRICS_PATH, get(health::metrics_endpoint))
        .route("/", get(animals::list_animals))
        .route("/:name", get(animals::get_animal))
        .fallback(health::not_found)
        .layer(from_fn_with_state(
            state.clone(),
            readiness_gate_middleware::<AppState>,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Does not wait for MongoDB and starts no background work; the connection
    /// monitor and the seed task start in [`Application::run_until_stopped`].
    pub async fn build(config: AnimalConfig) -> Result<Self, AppError> {
        let db = AnimalDb::connect(&config.mongodb).await.map_err(|e| {
            tracing::error!("Failed to set up MongoDB client: {}", e);
            e
        })?;

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            breeds_enabled = config.breeds_enabled,
            "Animal service bound"
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, db),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a handle on the database.
    pub fn db(&self) -> &AnimalDb {
        &self.state.db
    }

    /// Start the connection monitor and the seed task, serve until
    /// SIGINT/SIGTERM, then drain in-flight requests and stop both tasks.
    /// Requests are gated until the first successful ping.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let monitor = self
            .state
            .db
            .spawn_monitor(self.state.config.mongodb.probe_interval);
        let seeder = seed::spawn(self.state.db.clone(), self.state.config.breeds_enabled);

        tracing::info!("Server running on http://localhost:{}", self.port);

        let router = build_router(self.state);
        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        monitor.abort();
        seeder.abort();

        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
