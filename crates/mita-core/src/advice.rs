//! Advisors - insights, tips and risk factors attached to a recommendation
//!
//! Each advisor looks at the final allocation plus whatever collaborator data
//! was available and contributes human-readable lines. Advisors are
//! independent; one failing does not affect the others.

use tracing::{debug, warn};

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::categories::SAVINGS;
use crate::models::{
    BehaviorProfile, BehaviorTrait, Goal, IncomeTier, PeerData, SpendingHistory,
    SpendingPersonality,
};

/// Savings rate below which a risk factor is reported
const LOW_SAVINGS_RATE: f64 = 0.10;
/// Savings rate considered healthy
const HEALTHY_SAVINGS_RATE: f64 = 0.20;
/// Relative difference from peers worth mentioning
const PEER_MARGIN: f64 = 0.20;
/// Historical spending this far over the new budget is a risk
const HISTORY_OVERRUN: f64 = 1.10;

/// Everything an advisor may look at
#[derive(Debug, Clone, Copy)]
pub struct AdviceContext<'a> {
    pub income: f64,
    pub tier: IncomeTier,
    pub allocation: &'a CategoryAllocation,
    pub behavior: Option<&'a BehaviorProfile>,
    pub history: Option<&'a SpendingHistory>,
    pub peers: Option<&'a PeerData>,
    pub goals: &'a [Goal],
}

/// Lines contributed by advisors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advice {
    pub insights: Vec<String>,
    pub optimization_tips: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl Advice {
    pub fn extend(&mut self, other: Advice) {
        self.insights.extend(other.insights);
        self.optimization_tips.extend(other.optimization_tips);
        self.risk_factors.extend(other.risk_factors);
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty() && self.optimization_tips.is_empty() && self.risk_factors.is_empty()
    }
}

/// Strategy contributing advice to a recommendation
pub trait Advisor: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn advise(&self, ctx: &AdviceContext<'_>) -> Result<Advice>;
}

/// Reports on the share of income going to savings
pub struct SavingsRateAdvisor;

impl Advisor for SavingsRateAdvisor {
    fn id(&self) -> &'static str {
        "savings_rate"
    }

    fn name(&self) -> &'static str {
        "Savings Rate"
    }

    fn advise(&self, ctx: &AdviceContext<'_>) -> Result<Advice> {
        let mut advice = Advice::default();
        if ctx.income <= 0.0 {
            return Ok(advice);
        }

        let rate = ctx.allocation.amount(SAVINGS) / ctx.income;
        let pct = rate * 100.0;

        if rate < LOW_SAVINGS_RATE {
            advice.risk_factors.push(format!(
                "Savings rate of {:.1}% is below the recommended 10%",
                pct
            ));
            advice
                .optimization_tips
                .push("Automate a transfer to savings on payday".to_string());
        } else if rate >= HEALTHY_SAVINGS_RATE {
            advice.insights.push(format!(
                "You are saving {:.1}% of your income, at or above the 20% guideline",
                pct
            ));
        } else {
            advice
                .insights
                .push(format!("You are saving {:.1}% of your income", pct));
        }

        if ctx.goals.contains(&Goal::EmergencyFund) {
            let months = ctx.income * 3.0 / ctx.allocation.amount(SAVINGS).max(1.0);
            advice.optimization_tips.push(format!(
                "At this rate a three-month emergency fund takes about {:.0} months",
                months.ceil()
            ));
        }

        if matches!(ctx.tier, IncomeTier::UpperMiddle | IncomeTier::High) && rate < HEALTHY_SAVINGS_RATE
        {
            advice.optimization_tips.push(
                "Your income tier supports saving at least 20%; consider raising savings"
                    .to_string(),
            );
        }

        Ok(advice)
    }
}

/// Compares the allocation with what similar users spend
pub struct PeerComparisonAdvisor;

impl Advisor for PeerComparisonAdvisor {
    fn id(&self) -> &'static str {
        "peer_comparison"
    }

    fn name(&self) -> &'static str {
        "Peer Comparison"
    }

    fn advise(&self, ctx: &AdviceContext<'_>) -> Result<Advice> {
        let mut advice = Advice::default();
        let Some(peers) = ctx.peers else {
            return Ok(advice);
        };

        for (category, stat) in peers {
            let Some(amount) = ctx.allocation.get(category) else {
                continue;
            };
            let peer = stat.peer_average;
            if !peer.is_finite() || peer <= 0.0 {
                continue;
            }
            let diff = amount / peer - 1.0;
            if diff > PEER_MARGIN {
                advice.insights.push(format!(
                    "Your {} budget is {:.0}% above similar users",
                    category,
                    diff * 100.0
                ));
                advice.optimization_tips.push(format!(
                    "Similar users spend about {:.0} on {}; look for savings there",
                    peer, category
                ));
            } else if diff < -PEER_MARGIN {
                advice.insights.push(format!(
                    "Your {} budget is {:.0}% below similar users",
                    category,
                    -diff * 100.0
                ));
            }
        }
        Ok(advice)
    }
}

/// Advice from the behavioral profile and spending history
pub struct BehaviorAdvisor;

impl Advisor for BehaviorAdvisor {
    fn id(&self) -> &'static str {
        "behavior"
    }

    fn name(&self) -> &'static str {
        "Spending Behavior"
    }

    fn advise(&self, ctx: &AdviceContext<'_>) -> Result<Advice> {
        let mut advice = Advice::default();

        if let Some(behavior) = ctx.behavior {
            match behavior.spending_personality {
                SpendingPersonality::Conservative => advice
                    .insights
                    .push("Your careful spending leaves room to grow savings".to_string()),
                SpendingPersonality::Aggressive => advice
                    .risk_factors
                    .push("High discretionary spending puts savings targets at risk".to_string()),
                SpendingPersonality::Inconsistent => advice.risk_factors.push(
                    "Irregular spending makes monthly limits harder to hold".to_string(),
                ),
                SpendingPersonality::Balanced | SpendingPersonality::Unknown => {}
            }

            if behavior.has_trait(BehaviorTrait::WeekendOverspending) {
                advice
                    .risk_factors
                    .push("Spending spikes on weekends".to_string());
                advice
                    .optimization_tips
                    .push("Plan weekend activities with a fixed allowance".to_string());
            }
            if behavior.has_trait(BehaviorTrait::ImpulseBuying) {
                advice
                    .risk_factors
                    .push("Frequent impulse purchases".to_string());
                advice
                    .optimization_tips
                    .push("Wait 24 hours before unplanned purchases".to_string());
            }
            if behavior.has_trait(BehaviorTrait::GoalOriented) {
                advice
                    .insights
                    .push("Goal-oriented habits support this plan".to_string());
            }
        }

        if let Some(history) = ctx.history {
            for (category, &spent) in history {
                let Some(budget) = ctx.allocation.get(category) else {
                    continue;
                };
                if budget > 0.0 && spent > budget * HISTORY_OVERRUN {
                    advice.risk_factors.push(format!(
                        "Past {} spending ({:.2}) exceeds the new budget ({:.2})",
                        category, spent, budget
                    ));
                }
            }
        }

        Ok(advice)
    }
}

/// Runs every registered advisor
pub struct AdvicePanel {
    advisors: Vec<Box<dyn Advisor>>,
}

impl Default for AdvicePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvicePanel {
    /// Create a panel with the built-in advisors
    pub fn new() -> Self {
        let mut panel = Self::empty();

        panel.register(Box::new(SavingsRateAdvisor));
        panel.register(Box::new(PeerComparisonAdvisor));
        panel.register(Box::new(BehaviorAdvisor));

        panel
    }

    pub fn empty() -> Self {
        Self { advisors: vec![] }
    }

    pub fn register(&mut self, advisor: Box<dyn Advisor>) {
        self.advisors.push(advisor);
    }

    pub fn advisor_ids(&self) -> Vec<&'static str> {
        self.advisors.iter().map(|a| a.id()).collect()
    }

    /// Collect advice from every advisor, skipping failures
    pub fn advise_all(&self, ctx: &AdviceContext<'_>) -> Advice {
        let mut all = Advice::default();
        for advisor in &self.advisors {
            match advisor.advise(ctx) {
                Ok(advice) => {
                    debug!(
                        advisor = advisor.id(),
                        insights = advice.insights.len(),
                        tips = advice.optimization_tips.len(),
                        risks = advice.risk_factors.len(),
                        "Advisor complete"
                    );
                    all.extend(advice);
                }
                Err(e) => {
                    warn!(advisor = advisor.id(), error = %e, "Advisor failed");
                }
            }
        }
        all
    }
}
