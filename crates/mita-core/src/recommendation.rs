//! Recommendation engine - the full personalized budget flow
//!
//! Classify the income, fetch collaborator data concurrently, build a base
//! allocation, run the adjustment chain and attach advice. Collaborator
//! failures only lower the confidence; the caller always gets a usable
//! recommendation unless the income itself is invalid.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adjust::{Adjuster, AdjustmentContext, StageReport, StageStatus};
use crate::advice::{AdviceContext, AdvicePanel};
use crate::allocation::CategoryAllocation;
use crate::allocator::{validate_income, AllocationSource, Allocator};
use crate::config::EngineConfig;
use crate::calendar::days_remaining_after;
use crate::error::{Error, Result};
use crate::models::categories::SAVINGS;
use crate::models::{BudgetStyle, Goal, IncomeTier};
use crate::redistribute::{BudgetAdjustment, OptimizationContext, Redistributor};
use crate::sources::{BudgetDataSource, DataClient};
use crate::velocity::{VelocityMonitor, VelocityRecord};

/// Confidence with no collaborator data
pub const BASE_CONFIDENCE: f64 = 0.5;
/// Added per collaborator dataset present
const DATASET_CONFIDENCE: f64 = 0.1;
/// Added when the backend supplied the base allocation
const BACKEND_CONFIDENCE: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;
/// Days until the recommendation should be reviewed
pub const REVIEW_INTERVAL_DAYS: u64 = 30;

/// Input to a recommendation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub monthly_income: f64,
    /// Overrides the income classification
    #[serde(default)]
    pub tier: Option<IncomeTier>,
    /// Overrides the profile's goals
    #[serde(default)]
    pub goals: Option<Vec<Goal>>,
    /// Overrides the profile's location
    #[serde(default)]
    pub location: Option<String>,
}

impl RecommendationRequest {
    pub fn new(monthly_income: f64) -> Self {
        Self {
            monthly_income,
            ..Default::default()
        }
    }

    pub fn with_goals(mut self, goals: Vec<Goal>) -> Self {
        self.goals = Some(goals);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_tier(mut self, tier: IncomeTier) -> Self {
        self.tier = Some(tier);
        self
    }
}

/// Personalized budget with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecommendation {
    pub allocation: CategoryAllocation,
    pub total_allocated: f64,
    pub income_tier: IncomeTier,
    pub style: BudgetStyle,
    pub confidence: f64,
    pub behavioral_score: f64,
    pub savings_rate: f64,
    pub insights: Vec<String>,
    pub optimization_tips: Vec<String>,
    pub risk_factors: Vec<String>,
    /// Collaborator datasets that contributed
    pub data_sources: Vec<String>,
    pub allocation_source: AllocationSource,
    pub stages: Vec<StageReport>,
    pub generated_at: DateTime<Utc>,
    pub next_review_date: NaiveDate,
}

/// Confidence for a recommendation built from `datasets` collaborator datasets
pub fn recommendation_confidence(datasets: usize, backend_allocation: bool) -> f64 {
    let mut confidence = BASE_CONFIDENCE + DATASET_CONFIDENCE * datasets as f64;
    if backend_allocation {
        confidence += BACKEND_CONFIDENCE;
    }
    confidence.min(MAX_CONFIDENCE)
}

/// Await a collaborator fetch, degrading failures and timeouts to `None`
async fn fetch_optional<T, F>(what: &str, host: &str, timeout: Duration, fetch: F) -> Option<T>
where
    F: Future<Output = Result<Option<T>>>,
{
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(value)) => {
            debug!(what, host, present = value.is_some(), "Collaborator fetch complete");
            value
        }
        Ok(Err(e)) => {
            warn!(what, host, error = %e, "Collaborator fetch failed, treating as absent");
            None
        }
        Err(_) => {
            warn!(
                what,
                host,
                timeout_ms = timeout.as_millis() as u64,
                "Collaborator fetch timed out, treating as absent"
            );
            None
        }
    }
}

/// The budget engine with its collaborators
pub struct RecommendationEngine {
    config: EngineConfig,
    allocator: Allocator,
    adjuster: Adjuster,
    advisors: AdvicePanel,
    redistributor: Redistributor,
    source: Option<DataClient>,
}

impl RecommendationEngine {
    /// Engine with built-in stages, advisors and finders and no collaborator
    pub fn new(config: EngineConfig) -> Self {
        Self {
            allocator: Allocator::new(&config),
            adjuster: Adjuster::new(&config),
            advisors: AdvicePanel::new(),
            redistributor: Redistributor::new(&config),
            source: None,
            config,
        }
    }

    pub fn with_source(mut self, source: DataClient) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_adjuster(mut self, adjuster: Adjuster) -> Self {
        self.adjuster = adjuster;
        self
    }

    pub fn with_advisors(mut self, advisors: AdvicePanel) -> Self {
        self.advisors = advisors;
        self
    }

    pub fn with_redistributor(mut self, redistributor: Redistributor) -> Self {
        self.redistributor = redistributor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn source(&self) -> Option<&DataClient> {
        self.source.as_ref()
    }

    /// Velocity monitor over the configured fixed period
    pub fn velocity_monitor(&self) -> VelocityMonitor {
        VelocityMonitor::new(&self.config.velocity)
    }

    /// Velocity monitor over the calendar month of `date`
    pub fn velocity_monitor_for(&self, date: NaiveDate) -> VelocityMonitor {
        VelocityMonitor::for_month(&self.config.velocity, date)
    }

    /// Resolve the velocity period and the days left in it
    ///
    /// With `as_of` the period is that calendar month and the remaining days
    /// default to those after `as_of`; otherwise `remaining_days` is required
    /// and the configured fixed period is used.
    pub fn velocity_period(
        &self,
        as_of: Option<NaiveDate>,
        remaining_days: Option<u32>,
    ) -> Result<(VelocityMonitor, u32)> {
        let (monitor, remaining) = match (as_of, remaining_days) {
            (Some(date), days) => (
                self.velocity_monitor_for(date),
                days.unwrap_or_else(|| days_remaining_after(date)),
            ),
            (None, Some(days)) => (self.velocity_monitor(), days),
            (None, None) => {
                return Err(Error::InvalidInput(
                    "remaining_days or as_of is required".to_string(),
                ))
            }
        };

        if remaining > monitor.period_days() {
            return Err(Error::InvalidInput(format!(
                "remaining_days must be at most {}",
                monitor.period_days()
            )));
        }
        Ok((monitor, remaining))
    }

    /// Base allocation from the weight table
    pub fn allocate(&self, monthly_income: f64, tier: Option<IncomeTier>) -> Result<CategoryAllocation> {
        let tier = tier.unwrap_or_else(|| self.allocator.classify_income(monthly_income));
        self.allocator.allocate(monthly_income, tier)
    }

    /// Redistribute using collaborator behavior, peers and goals when available
    pub async fn redistribute(
        &self,
        records: &BTreeMap<String, VelocityRecord>,
        current_budget: &CategoryAllocation,
        monthly_income: f64,
    ) -> BudgetAdjustment {
        let (behavior, peers, profile) = match self.source.as_ref() {
            Some(source) => {
                let timeout = self.config.collaborators.timeout;
                let host = source.host();
                tokio::join!(
                    fetch_optional("behavior", host, timeout, source.fetch_behavioral_analysis()),
                    fetch_optional("peers", host, timeout, source.fetch_peer_comparison()),
                    fetch_optional("profile", host, timeout, source.fetch_user_profile()),
                )
            }
            None => (None, None, None),
        };

        let goals = profile.map(|p| p.goals).unwrap_or_default();
        let ctx = OptimizationContext::new(current_budget, records)
            .with_behavior(behavior.as_ref())
            .with_peers(peers.as_ref())
            .with_goals(&goals);

        self.redistributor
            .redistribute_with(records, current_budget, monthly_income, &ctx)
    }

    /// Build a personalized recommendation
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<BudgetRecommendation> {
        self.recommend_at(request, Utc::now()).await
    }

    /// Build a recommendation as of `now`
    pub async fn recommend_at(
        &self,
        request: &RecommendationRequest,
        now: DateTime<Utc>,
    ) -> Result<BudgetRecommendation> {
        let income = request.monthly_income;
        validate_income(income)?;

        let tier = request
            .tier
            .unwrap_or_else(|| self.allocator.classify_income(income));
        let timeout = self.config.collaborators.timeout;

        let collaborators = async {
            match self.source.as_ref() {
                Some(source) => {
                    let host = source.host();
                    tokio::join!(
                        fetch_optional("profile", host, timeout, source.fetch_user_profile()),
                        fetch_optional("history", host, timeout, source.fetch_spending_history()),
                        fetch_optional("behavior", host, timeout, source.fetch_behavioral_analysis()),
                        fetch_optional("peers", host, timeout, source.fetch_peer_comparison()),
                    )
                }
                None => (None, None, None, None),
            }
        };
        let base = self.allocator.allocate_with_backend(
            income,
            tier,
            self.source.as_ref().map(|s| s as &dyn BudgetDataSource),
            timeout,
        );

        let ((profile, history, behavior, peers), base) = tokio::join!(collaborators, base);
        let (base, allocation_source) = base?;

        let goals: &[Goal] = match (&request.goals, &profile) {
            (Some(goals), _) => goals,
            (None, Some(p)) => &p.goals,
            (None, None) => &[],
        };
        let location = request
            .location
            .as_deref()
            .or_else(|| profile.as_ref().and_then(|p| p.location.as_deref()));

        let mut ctx = AdjustmentContext::new(income)
            .with_behavior(behavior.as_ref())
            .with_history(history.as_ref())
            .with_peers(peers.as_ref())
            .with_goals(goals);
        if let Some(location) = location {
            ctx = ctx.with_location(location);
        }
        let adjusted = self.adjuster.apply(&base, &ctx);

        let advice = self.advisors.advise_all(&AdviceContext {
            income,
            tier,
            allocation: &adjusted.allocation,
            behavior: behavior.as_ref(),
            history: history.as_ref(),
            peers: peers.as_ref(),
            goals,
        });

        let mut data_sources = vec![];
        if profile.is_some() {
            data_sources.push("profile".to_string());
        }
        if history.is_some() {
            data_sources.push("history".to_string());
        }
        if behavior.is_some() {
            data_sources.push("behavior".to_string());
        }
        if peers.is_some() {
            data_sources.push("peers".to_string());
        }
        let datasets = data_sources.len();
        let from_backend = allocation_source == AllocationSource::Backend;
        if from_backend {
            data_sources.push("backend_allocation".to_string());
        }

        let allocation = adjusted.allocation;
        let total_allocated = allocation.total();
        let savings_rate = allocation.amount(SAVINGS) / income;
        let confidence = recommendation_confidence(datasets, from_backend);
        let next_review_date = now
            .date_naive()
            .checked_add_days(Days::new(REVIEW_INTERVAL_DAYS))
            .unwrap_or(now.date_naive());

        info!(
            income,
            tier = tier.as_str(),
            confidence,
            datasets,
            stages_applied = adjusted
                .stages
                .iter()
                .filter(|s| s.status == StageStatus::Applied)
                .count(),
            "Generated budget recommendation"
        );

        Ok(BudgetRecommendation {
            total_allocated,
            income_tier: tier,
            style: BudgetStyle::from_behavior(behavior.as_ref()),
            confidence,
            behavioral_score: behavior.as_ref().map(|b| b.score()).unwrap_or(0.5),
            savings_rate,
            insights: advice.insights,
            optimization_tips: advice.optimization_tips,
            risk_factors: advice.risk_factors,
            data_sources,
            allocation_source,
            stages: adjusted.stages,
            generated_at: now,
            next_review_date,
            allocation,
        })
    }
}
