//! Backend REST collaborator
//!
//! Talks to the MITA API service. Responses may be bare JSON or wrapped in a
//! `{"data": ...}` envelope. A 404 or a null payload means "no data".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::allocation::CategoryAllocation;
use crate::error::{Error, Result};
use crate::models::{BehaviorProfile, PeerData, SpendingHistory, UserProfile};

use super::BudgetDataSource;

const PROFILE_PATH: &str = "/api/users/me/profile";
const HISTORY_PATH: &str = "/api/transactions/spending-history";
const BEHAVIOR_PATH: &str = "/api/behavior/analysis";
const PEERS_PATH: &str = "/api/analytics/peer-comparison";
const ALLOCATION_PATH: &str = "/api/budget/suggested";
const HEALTH_PATH: &str = "/health";

/// HTTP client for the backend API
#[derive(Clone)]
pub struct HttpDataSource {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDataSource {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("MITA_API_URL").ok()?;
        let token = std::env::var("MITA_API_TOKEN").ok().filter(|t| !t.is_empty());
        Some(Self::new(&url, token.as_deref()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let mut request = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .query(query);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "Backend has no data");
            return Ok(None);
        }
        let response = response.error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let payload = unwrap_envelope(body);
        if payload.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(payload)?))
    }
}

/// Take the `data` field of a `{"data": ...}` envelope, or the body itself
fn unwrap_envelope(body: serde_json::Value) -> serde_json::Value {
    match body {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl BudgetDataSource for HttpDataSource {
    async fn fetch_user_profile(&self) -> Result<Option<UserProfile>> {
        self.get_json(PROFILE_PATH, &[]).await
    }

    async fn fetch_spending_history(&self) -> Result<Option<SpendingHistory>> {
        self.get_json(HISTORY_PATH, &[]).await
    }

    async fn fetch_behavioral_analysis(&self) -> Result<Option<BehaviorProfile>> {
        self.get_json(BEHAVIOR_PATH, &[]).await
    }

    async fn fetch_peer_comparison(&self) -> Result<Option<PeerData>> {
        self.get_json(PEERS_PATH, &[]).await
    }

    async fn fetch_backend_allocation(&self, income: f64) -> Result<Option<CategoryAllocation>> {
        if !income.is_finite() {
            return Err(Error::InvalidInput(format!("income {} is not finite", income)));
        }
        self.get_json(ALLOCATION_PATH, &[("income", format!("{:.2}", income))])
            .await
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}{}", self.base_url, HEALTH_PATH))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
