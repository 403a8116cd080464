//! Base allocation of a monthly income across categories

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocation::CategoryAllocation;
use crate::config::{EngineConfig, TierThresholds};
use crate::error::{Error, Result};
use crate::models::IncomeTier;
use crate::sources::BudgetDataSource;

/// Where a base allocation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationSource {
    /// Local weight table for the income tier
    WeightTable,
    /// Allocation suggested by the backend collaborator
    Backend,
}

/// Reject incomes that cannot be allocated
pub fn validate_income(income: f64) -> Result<()> {
    if !income.is_finite() || income <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "monthly income must be a positive amount, got {}",
            income
        )));
    }
    Ok(())
}

/// Splits a monthly income using fixed per-tier weight tables
#[derive(Debug, Clone)]
pub struct Allocator {
    tiers: TierThresholds,
    weights: std::collections::BTreeMap<IncomeTier, CategoryAllocation>,
}

impl Allocator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tiers: config.tiers.clone(),
            weights: config.weights.clone(),
        }
    }

    /// Tier for a monthly income
    pub fn classify_income(&self, amount: f64) -> IncomeTier {
        self.tiers.classify(amount)
    }

    /// Default weights for a tier (fractions summing to 1.0)
    pub fn default_weights(&self, tier: IncomeTier) -> Result<&CategoryAllocation> {
        self.weights
            .get(&tier)
            .ok_or_else(|| Error::Config(format!("No weight table for tier {}", tier)))
    }

    /// Multiply each tier weight by the income
    pub fn allocate(&self, monthly_income: f64, tier: IncomeTier) -> Result<CategoryAllocation> {
        validate_income(monthly_income)?;

        let weights = self.default_weights(tier)?;
        let allocation: CategoryAllocation = weights
            .iter()
            .map(|(category, weight)| (category, weight * monthly_income))
            .collect();

        debug!(
            income = monthly_income,
            tier = tier.as_str(),
            categories = allocation.len(),
            "Allocated income from weight table"
        );
        Ok(allocation)
    }

    /// Prefer the backend's allocation, falling back to the local table
    ///
    /// Collaborator failures, timeouts and unusable responses are logged and
    /// never returned; only invalid income is an error.
    pub async fn allocate_with_backend(
        &self,
        monthly_income: f64,
        tier: IncomeTier,
        source: Option<&(dyn BudgetDataSource + '_)>,
        timeout: Duration,
    ) -> Result<(CategoryAllocation, AllocationSource)> {
        validate_income(monthly_income)?;

        if let Some(source) = source {
            let fetched =
                tokio::time::timeout(timeout, source.fetch_backend_allocation(monthly_income))
                    .await;

            match fetched {
                Ok(Ok(Some(backend))) => {
                    if backend.is_well_formed() {
                        if let Ok(scaled) = backend.try_renormalize(monthly_income) {
                            debug!(
                                host = source.host(),
                                categories = scaled.len(),
                                "Using backend allocation"
                            );
                            return Ok((scaled, AllocationSource::Backend));
                        }
                    }
                    warn!(
                        host = source.host(),
                        "Backend allocation unusable, using weight table"
                    );
                }
                Ok(Ok(None)) => {
                    debug!(host = source.host(), "No backend allocation available");
                }
                Ok(Err(e)) => {
                    warn!(host = source.host(), error = %e, "Backend allocation failed, using weight table");
                }
                Err(_) => {
                    warn!(
                        host = source.host(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Backend allocation timed out, using weight table"
                    );
                }
            }
        }

        let local = self.allocate(monthly_income, tier)?;
        Ok((local, AllocationSource::WeightTable))
    }
}
