//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use mita_core::BudgetDataSource;

/// Live status of the data collaborator
#[derive(Debug, Serialize)]
pub struct CollaboratorStatus {
    pub host: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    /// Absent when the engine runs on defaults only
    pub collaborator: Option<CollaboratorStatus>,
}

/// GET /api/health - Engine and collaborator status
///
/// Always 200: a missing or unreachable collaborator degrades
/// recommendations but never makes the engine unavailable.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let collaborator = match state.engine.source() {
        Some(source) => Some(CollaboratorStatus {
            host: source.host().to_string(),
            available: source.health_check().await,
        }),
        None => None,
    };

    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        collaborator,
    })
}
