//! Goals stage: boost the categories that serve the user's goals

use std::collections::BTreeSet;

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::categories::{DEBT, INVESTMENTS, SAVINGS, TRAVEL};
use crate::models::Goal;

use super::{AdjustmentContext, AdjustmentStage};

/// One goal's effect on a category
struct Boost {
    category: &'static str,
    factor: f64,
    /// Share of income to seed with when the category is absent
    seed: Option<f64>,
}

fn boost_for(goal: &Goal) -> Option<Boost> {
    let (category, factor, seed) = match goal {
        Goal::EmergencyFund | Goal::Savings => (SAVINGS, 1.15, None),
        Goal::DebtPayoff => (DEBT, 1.20, None),
        Goal::Investment => (INVESTMENTS, 1.25, Some(0.05)),
        Goal::Travel => (TRAVEL, 1.50, Some(0.03)),
        Goal::HomePurchase => (SAVINGS, 1.25, None),
        Goal::Other(_) => return None,
    };
    Some(Boost {
        category,
        factor,
        seed,
    })
}

pub struct GoalsStage;

impl AdjustmentStage for GoalsStage {
    fn id(&self) -> &'static str {
        "goals"
    }

    fn name(&self) -> &'static str {
        "Goal Boosts"
    }

    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation> {
        let mut adjusted = allocation.clone();
        let mut touched = false;
        let mut seen = BTreeSet::new();

        for goal in ctx.goals {
            if !seen.insert(goal.as_str()) {
                continue;
            }
            let Some(boost) = boost_for(goal) else {
                continue;
            };
            if !adjusted.contains(boost.category) {
                match boost.seed {
                    Some(share) if ctx.income > 0.0 => {
                        adjusted.set(boost.category, ctx.income * share)
                    }
                    _ => continue,
                }
            }
            touched |= adjusted.scale(boost.category, boost.factor);
        }

        if !touched {
            return Ok(allocation.clone());
        }
        Ok(adjusted.renormalize(ctx.income))
    }
}
