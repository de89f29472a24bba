//! Database readiness signal and the request gate built on it.
//!
//! A single writer (the connection monitor) publishes [`ConnectionState`]
//! changes through a `watch` channel; the gate and any startup task waiting on
//! the database read from it.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_ready(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

/// Cloneable handle on the shared connection state.
#[derive(Clone, Debug)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new(ConnectionState::Connecting)
    }
}

impl ReadinessSignal {
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Publish a new state. Returns `true` when it differs from the previous one.
    pub fn set(&self, state: ConnectionState) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }

    /// Resolve once the state is `Connected`, immediately if it already is.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|state| state.is_ready()).await;
    }
}

/// Gate configuration: the signal to consult and the paths that bypass it.
#[derive(Clone, Debug, Default)]
pub struct ReadinessGate {
    pub signal: ReadinessSignal,
    pub excluded_paths: Vec<String>,
}

impl ReadinessGate {
    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|p| p == path)
    }
}

/// Reject every request with 503 until the database is connected.
pub async fn readiness_gate_middleware<S>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: AsRef<ReadinessGate> + Clone + Send + Sync + 'static,
{
    let gate = state.as_ref();

    if gate.is_excluded(req.uri().path()) || gate.signal.is_ready() {
        return Ok(next.run(req).await);
    }

    tracing::debug!(
        path = %req.uri().path(),
        state = gate.signal.state().as_str(),
        "Rejecting request, database not ready"
    );
    Err(AppError::ServiceUnavailable)
}
