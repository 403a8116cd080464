//! Redistributor - turns velocity records into budget adjustments
//!
//! Every category flagged by the velocity monitor gets a `CategoryAdjustment`.
//! Money is then moved from categories that will not use their budget to
//! categories that will overrun it, largest deficit first. A donor never
//! gives more than the configured share (50% by default) of its surplus.
//! Income not assigned to any category is an extra donor named
//! `unallocated`.
//!
//! Optimization suggestions come from pluggable `OptimizationFinder`s.

mod optimizations;

pub use optimizations::{
    BehavioralOptimizer, GoalOptimizer, Optimization, OptimizationContext, OptimizationFinder,
    OptimizationKind, PeerOptimizer,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocation::CategoryAllocation;
use crate::config::EngineConfig;
use crate::velocity::{Urgency, VelocityReason, VelocityRecord};

/// Donor name for income not assigned to any category
pub const UNALLOCATED: &str = "unallocated";

/// Amounts below this are not worth a transfer
const MIN_TRANSFER: f64 = 0.01;

/// Guidance emitted whenever any adjustment exists
pub const IMPLEMENTATION_STEPS: [&str; 5] = [
    "Review the recommended budget changes for each flagged category",
    "Move surplus from under-spent categories to cover projected overruns",
    "Update your category limits to the recommended amounts",
    "Set spending alerts on the categories that are trending over budget",
    "Check your spending velocity again in one week",
];

/// Recommended change for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAdjustment {
    pub category: String,
    pub current_amount: f64,
    pub recommended_amount: f64,
    pub reason: VelocityReason,
    pub confidence: f64,
    pub urgency: Urgency,
}

impl CategoryAdjustment {
    /// Size of the change
    pub fn impact(&self) -> f64 {
        (self.recommended_amount - self.current_amount).abs()
    }

    /// Positive when the category needs more money
    pub fn delta(&self) -> f64 {
        self.recommended_amount - self.current_amount
    }
}

/// Money moved from one category to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// Result of a redistribution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetAdjustment {
    pub adjustments: Vec<CategoryAdjustment>,
    pub transfers: Vec<Transfer>,
    pub optimizations: Vec<Optimization>,
    pub total_impact: f64,
    pub confidence: f64,
    pub implementation_steps: Vec<String>,
}

impl BudgetAdjustment {
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Budget after applying every transfer
    pub fn apply_transfers(&self, budget: &CategoryAllocation) -> CategoryAllocation {
        let mut out = budget.clone();
        for t in &self.transfers {
            if t.from != UNALLOCATED {
                out.set(t.from.clone(), out.amount(&t.from) - t.amount);
            }
            out.set(t.to.clone(), out.amount(&t.to) + t.amount);
        }
        out
    }
}

/// Builds budget adjustments from velocity records
pub struct Redistributor {
    surplus_cap: f64,
    finders: Vec<Box<dyn OptimizationFinder>>,
}

impl Redistributor {
    /// Create a redistributor with the built-in optimization finders
    pub fn new(config: &EngineConfig) -> Self {
        let mut redistributor = Self::empty(config.redistribution.surplus_cap);

        redistributor.register(Box::new(PeerOptimizer));
        redistributor.register(Box::new(BehavioralOptimizer));
        redistributor.register(Box::new(GoalOptimizer));

        redistributor
    }

    /// Create a redistributor with no optimization finders
    pub fn empty(surplus_cap: f64) -> Self {
        Self {
            surplus_cap: surplus_cap.clamp(0.0, 1.0),
            finders: vec![],
        }
    }

    pub fn register(&mut self, finder: Box<dyn OptimizationFinder>) {
        self.finders.push(finder);
    }

    pub fn finder_kinds(&self) -> Vec<OptimizationKind> {
        self.finders.iter().map(|f| f.id()).collect()
    }

    /// Redistribute without extra optimization context
    pub fn redistribute(
        &self,
        records: &BTreeMap<String, VelocityRecord>,
        current_budget: &CategoryAllocation,
        monthly_income: f64,
    ) -> BudgetAdjustment {
        let ctx = OptimizationContext::new(current_budget, records);
        self.redistribute_with(records, current_budget, monthly_income, &ctx)
    }

    /// Redistribute, running optimization finders over `ctx`
    pub fn redistribute_with(
        &self,
        records: &BTreeMap<String, VelocityRecord>,
        current_budget: &CategoryAllocation,
        monthly_income: f64,
        ctx: &OptimizationContext<'_>,
    ) -> BudgetAdjustment {
        let adjustments: Vec<CategoryAdjustment> = records
            .iter()
            .filter(|(_, r)| r.needs_adjustment)
            .map(|(category, r)| CategoryAdjustment {
                category: category.clone(),
                current_amount: current_budget.get(category).unwrap_or(r.budget),
                recommended_amount: r.recommended_amount,
                reason: r.reason,
                confidence: r.confidence,
                urgency: r.urgency,
            })
            .collect();

        if adjustments.is_empty() {
            debug!("No categories need adjustment");
            return BudgetAdjustment::default();
        }

        let total_impact: f64 = adjustments.iter().map(CategoryAdjustment::impact).sum();
        let confidence =
            adjustments.iter().map(|a| a.confidence).sum::<f64>() / adjustments.len() as f64;

        let unallocated = if monthly_income.is_finite() {
            (monthly_income - current_budget.total()).max(0.0)
        } else {
            0.0
        };
        let transfers = plan_transfers(&adjustments, unallocated, self.surplus_cap);
        let optimizations = self.find_optimizations(ctx);

        debug!(
            adjustments = adjustments.len(),
            transfers = transfers.len(),
            optimizations = optimizations.len(),
            total_impact,
            "Redistribution planned"
        );

        BudgetAdjustment {
            adjustments,
            transfers,
            optimizations,
            total_impact,
            confidence,
            implementation_steps: IMPLEMENTATION_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn find_optimizations(&self, ctx: &OptimizationContext<'_>) -> Vec<Optimization> {
        let mut all = vec![];
        for finder in &self.finders {
            match finder.find(ctx) {
                Ok(found) => {
                    debug!(
                        finder = finder.id().as_str(),
                        count = found.len(),
                        "Optimization finder complete"
                    );
                    all.extend(found);
                }
                Err(e) => {
                    warn!(
                        finder = finder.id().as_str(),
                        error = %e,
                        "Optimization finder failed"
                    );
                }
            }
        }

        // Largest effect first
        all.sort_by(|a, b| b.monthly_amount.total_cmp(&a.monthly_amount));
        all
    }
}

/// Greedy matching of the largest deficits to the largest surpluses
fn plan_transfers(
    adjustments: &[CategoryAdjustment],
    unallocated: f64,
    surplus_cap: f64,
) -> Vec<Transfer> {
    let mut deficits: Vec<(&str, f64)> = adjustments
        .iter()
        .filter(|a| a.delta() > 0.0)
        .map(|a| (a.category.as_str(), a.delta()))
        .collect();

    let mut donors: Vec<(&str, f64)> = adjustments
        .iter()
        .filter(|a| a.delta() < 0.0)
        .map(|a| (a.category.as_str(), -a.delta() * surplus_cap))
        .collect();
    if unallocated > 0.0 {
        donors.push((UNALLOCATED, unallocated * surplus_cap));
    }

    deficits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut transfers = vec![];
    for (to, mut need) in deficits {
        while need >= MIN_TRANSFER {
            donors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            let Some(donor) = donors.first_mut() else {
                break;
            };
            let amount = need.min(donor.1);
            if amount < MIN_TRANSFER {
                break;
            }
            transfers.push(Transfer {
                from: donor.0.to_string(),
                to: to.to_string(),
                amount,
            });
            donor.1 -= amount;
            need -= amount;
        }
    }
    transfers
}
