//! Behavioral stage: personality and trait multipliers

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::categories::{ENTERTAINMENT, SAVINGS, SHOPPING};
use crate::models::{BehaviorProfile, BehaviorTrait, SpendingPersonality};

use super::{AdjustmentContext, AdjustmentStage};

pub struct BehavioralStage;

impl BehavioralStage {
    /// Apply personality then trait multipliers without renormalizing.
    /// Returns false if no multiplier applied.
    pub(crate) fn apply_multipliers(
        allocation: &mut CategoryAllocation,
        profile: &BehaviorProfile,
    ) -> bool {
        let mut touched = false;

        match profile.spending_personality {
            SpendingPersonality::Conservative => {
                touched |= allocation.scale(SAVINGS, 1.15);
                touched |= allocation.scale(ENTERTAINMENT, 0.85);
            }
            SpendingPersonality::Aggressive => {
                touched |= allocation.scale(ENTERTAINMENT, 1.20);
                touched |= allocation.scale(SHOPPING, 1.10);
                touched |= allocation.scale(SAVINGS, 0.90);
            }
            SpendingPersonality::Inconsistent => {
                allocation.scale_all(0.95);
                allocation.scale(SAVINGS, 1.10);
                touched |= !allocation.is_empty();
            }
            SpendingPersonality::Balanced | SpendingPersonality::Unknown => {}
        }

        // key_traits is a set, so each trait applies once
        for t in &profile.key_traits {
            match t {
                BehaviorTrait::WeekendOverspending => {
                    touched |= allocation.scale(ENTERTAINMENT, 0.90);
                }
                BehaviorTrait::ImpulseBuying => {
                    touched |= allocation.scale(SHOPPING, 0.85);
                    touched |= allocation.scale(ENTERTAINMENT, 0.90);
                }
                BehaviorTrait::GoalOriented => {
                    touched |= allocation.scale(SAVINGS, 1.10);
                }
                BehaviorTrait::Unknown => {}
            }
        }

        touched
    }
}

impl AdjustmentStage for BehavioralStage {
    fn id(&self) -> &'static str {
        "behavioral"
    }

    fn name(&self) -> &'static str {
        "Behavioral Adjustment"
    }

    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation> {
        let Some(profile) = ctx.behavior else {
            return Ok(allocation.clone());
        };

        let mut adjusted = allocation.clone();
        if !Self::apply_multipliers(&mut adjusted, profile) {
            return Ok(allocation.clone());
        }
        Ok(adjusted.renormalize(ctx.income))
    }
}
