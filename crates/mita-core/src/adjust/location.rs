//! Location stage: cost-of-living multipliers

use crate::allocation::CategoryAllocation;
use crate::config::LocationConfig;
use crate::error::Result;
use crate::models::categories::{FOOD, HOUSING, TRANSPORTATION};

use super::{AdjustmentContext, AdjustmentStage};

const HIGH_COST: [(&str, f64); 3] = [(HOUSING, 1.25), (FOOD, 1.15), (TRANSPORTATION, 1.10)];
const LOW_COST: [(&str, f64); 3] = [(HOUSING, 0.80), (FOOD, 0.90), (TRANSPORTATION, 0.85)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostOfLiving {
    High,
    Low,
}

pub struct LocationStage {
    high_cost: Vec<String>,
    low_cost: Vec<String>,
}

impl LocationStage {
    pub fn new(config: &LocationConfig) -> Self {
        let normalize = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            high_cost: normalize(&config.high_cost),
            low_cost: normalize(&config.low_cost),
        }
    }

    /// Match a free-form location against the configured lists. High-cost wins.
    pub fn classify(&self, location: &str) -> Option<CostOfLiving> {
        let location = location.to_lowercase();
        if self.high_cost.iter().any(|c| location.contains(c.as_str())) {
            Some(CostOfLiving::High)
        } else if self.low_cost.iter().any(|c| location.contains(c.as_str())) {
            Some(CostOfLiving::Low)
        } else {
            None
        }
    }
}

impl AdjustmentStage for LocationStage {
    fn id(&self) -> &'static str {
        "location"
    }

    fn name(&self) -> &'static str {
        "Cost of Living"
    }

    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation> {
        let multipliers = match ctx.location.and_then(|l| self.classify(l)) {
            Some(CostOfLiving::High) => HIGH_COST,
            Some(CostOfLiving::Low) => LOW_COST,
            None => return Ok(allocation.clone()),
        };

        let mut adjusted = allocation.clone();
        let mut touched = false;
        for (category, factor) in multipliers {
            touched |= adjusted.scale(category, factor);
        }

        if !touched {
            return Ok(allocation.clone());
        }
        Ok(adjusted.renormalize(ctx.income))
    }
}
