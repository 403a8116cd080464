//! Pluggable data collaborators
//!
//! The engine never fetches data itself; it asks a `BudgetDataSource` for the
//! optional inputs that refine a recommendation. Every fetch may fail or
//! return nothing, and the engine treats both as "data absent".
//!
//! # Architecture
//!
//! - `BudgetDataSource` trait: the interface for all collaborators
//! - `DataClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `HttpDataSource`, `SnapshotSource`, `MockDataSource`
//!
//! # Configuration
//!
//! Environment variables:
//! - `MITA_DATA_SOURCE`: Source to use (http, snapshot, mock). Default: inferred
//! - `MITA_API_URL`: Backend base URL (required for http)
//! - `MITA_API_TOKEN`: Bearer token for the backend (optional)
//! - `MITA_DATA_FILE`: JSON snapshot path (required for snapshot)

mod http;
mod mock;
mod snapshot;

pub use http::HttpDataSource;
pub use mock::MockDataSource;
pub use snapshot::{DataSnapshot, SnapshotSource};

use async_trait::async_trait;

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::{BehaviorProfile, PeerData, SpendingHistory, UserProfile};

/// Interface for the external data the engine consumes
///
/// `Ok(None)` means the collaborator has no data; `Err` means it failed.
/// Callers degrade both to "absent".
#[async_trait]
pub trait BudgetDataSource: Send + Sync {
    /// User profile (location, goals, declared income)
    async fn fetch_user_profile(&self) -> Result<Option<UserProfile>>;

    /// Spending per category over a reference period
    async fn fetch_spending_history(&self) -> Result<Option<SpendingHistory>>;

    /// Behavioral analysis of the user's spending
    async fn fetch_behavioral_analysis(&self) -> Result<Option<BehaviorProfile>>;

    /// Peer averages per category
    async fn fetch_peer_comparison(&self) -> Result<Option<PeerData>>;

    /// Backend-suggested allocation for an income
    async fn fetch_backend_allocation(&self, income: f64) -> Result<Option<CategoryAllocation>>;

    /// Check if the collaborator is reachable
    async fn health_check(&self) -> bool;

    /// Host or location description (for logging)
    fn host(&self) -> &str;
}

/// Concrete data client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum DataClient {
    /// Backend REST API
    Http(HttpDataSource),
    /// Fixed data loaded from a JSON snapshot
    Snapshot(SnapshotSource),
    /// Mock source for testing
    Mock(MockDataSource),
}

impl DataClient {
    /// Create a data client from environment variables
    ///
    /// Returns None if nothing is configured or the configured source cannot be set up.
    pub fn from_env() -> Option<Self> {
        let kind = std::env::var("MITA_DATA_SOURCE").ok().or_else(|| {
            if std::env::var("MITA_API_URL").is_ok() {
                Some("http".to_string())
            } else if std::env::var("MITA_DATA_FILE").is_ok() {
                Some("snapshot".to_string())
            } else {
                None
            }
        })?;

        match kind.to_lowercase().as_str() {
            "http" => HttpDataSource::from_env().map(DataClient::Http),
            "snapshot" | "file" => {
                let path = std::env::var("MITA_DATA_FILE").ok()?;
                match SnapshotSource::from_file(&path) {
                    Ok(s) => Some(DataClient::Snapshot(s)),
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "Failed to load data snapshot");
                        None
                    }
                }
            }
            "mock" => Some(DataClient::Mock(MockDataSource::sample())),
            _ => {
                tracing::warn!(source = %kind, "Unknown MITA_DATA_SOURCE, no collaborator configured");
                None
            }
        }
    }

    /// Create an HTTP client for a backend
    pub fn http(base_url: &str, token: Option<&str>) -> Self {
        DataClient::Http(HttpDataSource::new(base_url, token))
    }

    /// Load a JSON snapshot from disk
    pub fn snapshot_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(DataClient::Snapshot(SnapshotSource::from_file(path)?))
    }

    /// Create a mock source with canned sample data
    pub fn mock() -> Self {
        DataClient::Mock(MockDataSource::sample())
    }
}

// Implement BudgetDataSource for DataClient by delegating to the inner source
#[async_trait]
impl BudgetDataSource for DataClient {
    async fn fetch_user_profile(&self) -> Result<Option<UserProfile>> {
        match self {
            DataClient::Http(s) => s.fetch_user_profile().await,
            DataClient::Snapshot(s) => s.fetch_user_profile().await,
            DataClient::Mock(s) => s.fetch_user_profile().await,
        }
    }

    async fn fetch_spending_history(&self) -> Result<Option<SpendingHistory>> {
        match self {
            DataClient::Http(s) => s.fetch_spending_history().await,
            DataClient::Snapshot(s) => s.fetch_spending_history().await,
            DataClient::Mock(s) => s.fetch_spending_history().await,
        }
    }

    async fn fetch_behavioral_analysis(&self) -> Result<Option<BehaviorProfile>> {
        match self {
            DataClient::Http(s) => s.fetch_behavioral_analysis().await,
            DataClient::Snapshot(s) => s.fetch_behavioral_analysis().await,
            DataClient::Mock(s) => s.fetch_behavioral_analysis().await,
        }
    }

    async fn fetch_peer_comparison(&self) -> Result<Option<PeerData>> {
        match self {
            DataClient::Http(s) => s.fetch_peer_comparison().await,
            DataClient::Snapshot(s) => s.fetch_peer_comparison().await,
            DataClient::Mock(s) => s.fetch_peer_comparison().await,
        }
    }

    async fn fetch_backend_allocation(&self, income: f64) -> Result<Option<CategoryAllocation>> {
        match self {
            DataClient::Http(s) => s.fetch_backend_allocation(income).await,
            DataClient::Snapshot(s) => s.fetch_backend_allocation(income).await,
            DataClient::Mock(s) => s.fetch_backend_allocation(income).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            DataClient::Http(s) => s.health_check().await,
            DataClient::Snapshot(s) => s.health_check().await,
            DataClient::Mock(s) => s.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            DataClient::Http(s) => s.host(),
            DataClient::Snapshot(s) => s.host(),
            DataClient::Mock(s) => s.host(),
        }
    }
}
