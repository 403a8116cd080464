//! Mock data source for testing
//!
//! Returns configurable canned data, can be made to fail every call, and can
//! add an artificial delay to exercise collaborator timeouts.

use std::time::Duration;

use async_trait::async_trait;

use crate::allocation::CategoryAllocation;
use crate::error::{Error, Result};
use crate::models::{
    BehaviorProfile, BehaviorTrait, Goal, PeerData, PeerStat, SpendingHistory,
    SpendingPersonality, UserProfile,
};

use super::snapshot::DataSnapshot;
use super::BudgetDataSource;

/// Mock data source
#[derive(Clone, Default)]
pub struct MockDataSource {
    pub data: DataSnapshot,
    /// When false every fetch fails and health_check returns false
    pub healthy: bool,
    /// Delay applied before each fetch
    pub delay: Option<Duration>,
}

impl MockDataSource {
    /// Healthy source with no data
    pub fn new() -> Self {
        Self {
            data: DataSnapshot::default(),
            healthy: true,
            delay: None,
        }
    }

    /// Source whose every fetch fails
    pub fn unavailable() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Healthy source with a realistic data set
    pub fn sample() -> Self {
        let history: SpendingHistory = [
            ("housing", 1400.0),
            ("food", 620.0),
            ("transportation", 310.0),
            ("entertainment", 280.0),
            ("savings", 500.0),
            ("other", 390.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let peers: PeerData = [("food", 520.0), ("entertainment", 180.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), PeerStat { peer_average: v }))
            .collect();

        Self::new()
            .with_profile(UserProfile {
                location: Some("Austin, TX".to_string()),
                goals: vec![Goal::EmergencyFund],
                monthly_income: Some(4000.0),
                currency: Some("USD".to_string()),
            })
            .with_history(history)
            .with_behavior(
                BehaviorProfile::new(SpendingPersonality::Balanced)
                    .with_trait(BehaviorTrait::WeekendOverspending),
            )
            .with_peers(peers)
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.data.profile = Some(profile);
        self
    }

    pub fn with_history(mut self, history: SpendingHistory) -> Self {
        self.data.history = Some(history);
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorProfile) -> Self {
        self.data.behavior = Some(behavior);
        self
    }

    pub fn with_peers(mut self, peers: PeerData) -> Self {
        self.data.peers = Some(peers);
        self
    }

    pub fn with_backend_allocation(mut self, allocation: CategoryAllocation) -> Self {
        self.data.backend_allocation = Some(allocation);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn respond<T: Clone>(&self, what: &str, value: &Option<T>) -> Result<Option<T>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.healthy {
            return Err(Error::CollaboratorUnavailable(format!(
                "mock source is unavailable ({})",
                what
            )));
        }
        Ok(value.clone())
    }
}

#[async_trait]
impl BudgetDataSource for MockDataSource {
    async fn fetch_user_profile(&self) -> Result<Option<UserProfile>> {
        self.respond("profile", &self.data.profile).await
    }

    async fn fetch_spending_history(&self) -> Result<Option<SpendingHistory>> {
        self.respond("history", &self.data.history).await
    }

    async fn fetch_behavioral_analysis(&self) -> Result<Option<BehaviorProfile>> {
        self.respond("behavior", &self.data.behavior).await
    }

    async fn fetch_peer_comparison(&self) -> Result<Option<PeerData>> {
        self.respond("peers", &self.data.peers).await
    }

    async fn fetch_backend_allocation(&self, _income: f64) -> Result<Option<CategoryAllocation>> {
        self.respond("backend allocation", &self.data.backend_allocation)
            .await
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
