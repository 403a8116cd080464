//! MITA Budget Server
//!
//! Axum-based REST API exposing the budget engine to the MITA API layer.
//!
//! Endpoints:
//! - `GET  /api/health` - engine and collaborator status
//! - `POST /api/budget/allocate` - base allocation for an income
//! - `POST /api/budget/recommend` - personalized recommendation
//! - `POST /api/budget/velocity` - spending velocity per category
//! - `POST /api/budget/redistribute` - velocity plus redistribution plan
//! - `POST /api/budget/daily` - daily budget calendar
//!
//! Errors are returned as `{"error": "..."}`; invalid input maps to 400 and
//! everything else to a generic 500.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use mita_core::{BudgetDataSource, RecommendationEngine};

mod handlers;

/// Default limit on categories in a single request body
pub const DEFAULT_MAX_CATEGORIES: usize = 256;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Maximum categories accepted in a budget or spent map
    pub max_categories: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            max_categories: DEFAULT_MAX_CATEGORIES,
        }
    }
}

impl ServerConfig {
    /// Read `MITA_ALLOWED_ORIGINS` (comma-separated) and `MITA_MAX_CATEGORIES`
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("MITA_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let max_categories = std::env::var("MITA_MAX_CATEGORIES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CATEGORIES);
        Self {
            allowed_origins,
            max_categories,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub engine: RecommendationEngine,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(engine: RecommendationEngine, config: ServerConfig) -> Router {
    let cors = build_cors(&config);
    let state = Arc::new(AppState { engine, config });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/budget/allocate", post(handlers::allocate))
        .route("/budget/recommend", post(handlers::recommend))
        .route("/budget/velocity", post(handlers::velocity))
        .route("/budget/redistribute", post(handlers::redistribute))
        .route("/budget/daily", post(handlers::daily));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        cors
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve(engine: RecommendationEngine, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(engine, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    engine: RecommendationEngine,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_collaborator(&engine).await;

    let app = create_router(engine, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log collaborator connection status
async fn check_collaborator(engine: &RecommendationEngine) {
    match engine.source() {
        Some(source) => {
            if source.health_check().await {
                info!("✅ Data collaborator connected: {}", source.host());
            } else {
                warn!(
                    "⚠️  Data collaborator configured but not responding: {} (recommendations fall back to defaults)",
                    source.host()
                );
            }
        }
        None => {
            info!("ℹ️  No data collaborator configured (set MITA_API_URL or MITA_DATA_FILE to enable personalization)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map an engine error: invalid input is the caller's fault, the rest is ours
    pub fn engine(err: mita_core::Error) -> Self {
        if err.is_fatal() {
            Self::bad_request(&err.to_string())
        } else {
            err.into()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
