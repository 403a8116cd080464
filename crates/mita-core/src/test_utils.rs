//! Test utilities for mita-core
//!
//! This module provides a mock MITA backend server that serves the REST
//! endpoints `HttpDataSource` talks to, for development and integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::sources::DataSnapshot;

/// How the mock backend answers data requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Serve the snapshot, wrapping payloads in `{"data": ...}` envelopes
    Enveloped,
    /// Serve the snapshot as bare JSON bodies
    Bare,
    /// Answer every data request with 500
    Failing,
}

struct MockState {
    data: DataSnapshot,
    mode: BackendMode,
    token: Option<String>,
}

/// Mock backend server for testing and development
pub struct MockBackendServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackendServer {
    /// Start the mock server on an available port
    pub async fn start(data: DataSnapshot) -> Self {
        Self::start_with(data, BackendMode::Enveloped, None).await
    }

    /// Start a server whose data endpoints always fail
    pub async fn start_failing() -> Self {
        Self::start_with(DataSnapshot::default(), BackendMode::Failing, None).await
    }

    /// Start with an explicit mode, optionally requiring a bearer token
    pub async fn start_with(data: DataSnapshot, mode: BackendMode, token: Option<&str>) -> Self {
        let state = Arc::new(MockState {
            data,
            mode,
            token: token.map(str::to_string),
        });

        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/api/users/me/profile", get(handle_profile))
            .route("/api/transactions/spending-history", get(handle_history))
            .route("/api/behavior/analysis", get(handle_behavior))
            .route("/api/analytics/peer-comparison", get(handle_peers))
            .route("/api/budget/suggested", get(handle_suggested))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBackendServer {
    fn drop(&mut self) {
        self.stop();
    }
}

type Shared = State<Arc<MockState>>;

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

/// Serve one optional dataset according to the server mode
fn respond<T: Serialize>(state: &MockState, headers: &HeaderMap, value: Option<&T>) -> Response {
    if let Some(ref expected) = state.token {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    match (state.mode, value) {
        (BackendMode::Failing, _) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        (_, None) => StatusCode::NOT_FOUND.into_response(),
        (BackendMode::Enveloped, Some(v)) => {
            Json(serde_json::json!({"success": true, "data": v})).into_response()
        }
        (BackendMode::Bare, Some(v)) => Json(v).into_response(),
    }
}

async fn handle_profile(State(state): Shared, headers: HeaderMap) -> Response {
    respond(&state, &headers, state.data.profile.as_ref())
}

async fn handle_history(State(state): Shared, headers: HeaderMap) -> Response {
    respond(&state, &headers, state.data.history.as_ref())
}

async fn handle_behavior(State(state): Shared, headers: HeaderMap) -> Response {
    respond(&state, &headers, state.data.behavior.as_ref())
}

async fn handle_peers(State(state): Shared, headers: HeaderMap) -> Response {
    respond(&state, &headers, state.data.peers.as_ref())
}

async fn handle_suggested(
    State(state): Shared,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let valid_income = params
        .get("income")
        .and_then(|v| v.parse::<f64>().ok())
        .is_some_and(|v| v > 0.0);
    if !valid_income {
        return StatusCode::BAD_REQUEST.into_response();
    }
    respond(&state, &headers, state.data.backend_allocation.as_ref())
}
