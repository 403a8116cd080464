//! History stage: blend historical spending shares into the allocation

use crate::allocation::CategoryAllocation;
use crate::error::Result;

use super::{AdjustmentContext, AdjustmentStage};

/// Weight of the historical share in the blend
const HISTORY_WEIGHT: f64 = 0.6;
/// Weight of the current allocation share in the blend
const CURRENT_WEIGHT: f64 = 0.4;

pub struct HistoryStage;

impl AdjustmentStage for HistoryStage {
    fn id(&self) -> &'static str {
        "history"
    }

    fn name(&self) -> &'static str {
        "Spending History Blend"
    }

    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation> {
        let Some(history) = ctx.history else {
            return Ok(allocation.clone());
        };

        let valid = || {
            history
                .iter()
                .filter(|(_, v)| v.is_finite() && **v >= 0.0)
        };
        let total_historical: f64 = valid().map(|(_, v)| v).sum();
        if total_historical <= 0.0 || ctx.income <= 0.0 {
            return Ok(allocation.clone());
        }

        let mut adjusted = allocation.clone();
        for (category, &historical) in valid() {
            let current = allocation.amount(category);
            let blended = HISTORY_WEIGHT * (historical / total_historical)
                + CURRENT_WEIGHT * (current / ctx.income);
            adjusted.set(category.clone(), ctx.income * blended);
        }

        Ok(adjusted.renormalize(ctx.income))
    }
}
