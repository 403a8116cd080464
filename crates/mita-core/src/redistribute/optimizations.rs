//! Optimization finders - suggestions that accompany a redistribution

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::categories::{DEBT, ENTERTAINMENT, INVESTMENTS, SAVINGS, SHOPPING, TRAVEL};
use crate::models::{BehaviorProfile, BehaviorTrait, Goal, PeerData, SpendingPersonality};
use crate::velocity::{VelocityReason, VelocityRecord};

/// Peer averages this far above are worth flagging
const PEER_EXCESS_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationKind {
    /// Category budget well above what similar users spend
    Peer,
    /// Spending pattern the user could change
    Behavioral,
    /// Unspent money that could serve a goal
    Goal,
}

impl OptimizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peer => "peer",
            Self::Behavioral => "behavioral",
            Self::Goal => "goal",
        }
    }
}

impl fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptimizationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "peer" => Ok(Self::Peer),
            "behavioral" => Ok(Self::Behavioral),
            "goal" => Ok(Self::Goal),
            _ => Err(format!("Unknown optimization kind: {}", s)),
        }
    }
}

/// A suggested change with its estimated monthly effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub kind: OptimizationKind,
    pub category: String,
    pub title: String,
    pub description: String,
    /// Estimated amount freed (or redirected) per month
    pub monthly_amount: f64,
}

/// Data available to optimization finders
#[derive(Debug, Clone, Copy)]
pub struct OptimizationContext<'a> {
    pub budget: &'a CategoryAllocation,
    pub records: &'a BTreeMap<String, VelocityRecord>,
    pub behavior: Option<&'a BehaviorProfile>,
    pub peers: Option<&'a PeerData>,
    pub goals: &'a [Goal],
}

impl<'a> OptimizationContext<'a> {
    pub fn new(
        budget: &'a CategoryAllocation,
        records: &'a BTreeMap<String, VelocityRecord>,
    ) -> Self {
        Self {
            budget,
            records,
            behavior: None,
            peers: None,
            goals: &[],
        }
    }

    pub fn with_behavior(mut self, behavior: Option<&'a BehaviorProfile>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_peers(mut self, peers: Option<&'a PeerData>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_goals(mut self, goals: &'a [Goal]) -> Self {
        self.goals = goals;
        self
    }
}

/// Strategy producing optimizations for a redistribution
pub trait OptimizationFinder: Send + Sync {
    fn id(&self) -> OptimizationKind;

    fn name(&self) -> &'static str;

    fn find(&self, ctx: &OptimizationContext<'_>) -> Result<Vec<Optimization>>;
}

/// Flags categories budgeted well above peer averages
pub struct PeerOptimizer;

impl OptimizationFinder for PeerOptimizer {
    fn id(&self) -> OptimizationKind {
        OptimizationKind::Peer
    }

    fn name(&self) -> &'static str {
        "Peer Comparison"
    }

    fn find(&self, ctx: &OptimizationContext<'_>) -> Result<Vec<Optimization>> {
        let Some(peers) = ctx.peers else {
            return Ok(vec![]);
        };

        let mut found = Vec::new();
        for (category, stat) in peers {
            let Some(current) = ctx.budget.get(category) else {
                continue;
            };
            let peer = stat.peer_average;
            if !peer.is_finite() || peer <= 0.0 || current <= peer * PEER_EXCESS_RATIO {
                continue;
            }
            found.push(Optimization {
                kind: OptimizationKind::Peer,
                category: category.clone(),
                title: format!("{} above peer average", capitalize(category)),
                description: format!(
                    "Your {} budget of {:.2} is {:.0}% above similar users ({:.2})",
                    category,
                    current,
                    (current / peer - 1.0) * 100.0,
                    peer
                ),
                monthly_amount: current - peer,
            });
        }
        Ok(found)
    }
}

/// Suggestions driven by spending personality and traits
pub struct BehavioralOptimizer;

impl OptimizationFinder for BehavioralOptimizer {
    fn id(&self) -> OptimizationKind {
        OptimizationKind::Behavioral
    }

    fn name(&self) -> &'static str {
        "Spending Behavior"
    }

    fn find(&self, ctx: &OptimizationContext<'_>) -> Result<Vec<Optimization>> {
        let Some(behavior) = ctx.behavior else {
            return Ok(vec![]);
        };

        let mut found = Vec::new();

        if behavior.has_trait(BehaviorTrait::WeekendOverspending) {
            if let Some(amount) = ctx.budget.get(ENTERTAINMENT) {
                found.push(Optimization {
                    kind: OptimizationKind::Behavioral,
                    category: ENTERTAINMENT.to_string(),
                    title: "Cap weekend spending".to_string(),
                    description: "Set a fixed weekend entertainment allowance".to_string(),
                    monthly_amount: amount * 0.10,
                });
            }
        }

        if behavior.has_trait(BehaviorTrait::ImpulseBuying) {
            if let Some(amount) = ctx.budget.get(SHOPPING) {
                found.push(Optimization {
                    kind: OptimizationKind::Behavioral,
                    category: SHOPPING.to_string(),
                    title: "Wait before unplanned purchases".to_string(),
                    description: "Add a 24-hour pause before any unplanned purchase".to_string(),
                    monthly_amount: amount * 0.15,
                });
            }
        }

        if behavior.spending_personality == SpendingPersonality::Inconsistent {
            for (category, record) in ctx.records {
                if !matches!(
                    record.reason,
                    VelocityReason::SignificantlyOverBudget
                        | VelocityReason::TrendingOverBudget
                        | VelocityReason::Unbudgeted
                ) {
                    continue;
                }
                found.push(Optimization {
                    kind: OptimizationKind::Behavioral,
                    category: category.clone(),
                    title: format!("Weekly limit for {}", category),
                    description: format!(
                        "Split the {} budget into weekly limits to smooth spending",
                        category
                    ),
                    monthly_amount: (record.projected_monthly - record.budget).max(0.0),
                });
            }
        }

        Ok(found)
    }
}

/// Points unspent money at the user's first actionable goal
pub struct GoalOptimizer;

impl GoalOptimizer {
    fn target(goals: &[Goal]) -> Option<(&'static str, &'static str)> {
        goals.iter().find_map(|g| match g {
            Goal::EmergencyFund => Some((SAVINGS, "your emergency fund")),
            Goal::Savings | Goal::HomePurchase => Some((SAVINGS, "savings")),
            Goal::DebtPayoff => Some((DEBT, "debt payoff")),
            Goal::Investment => Some((INVESTMENTS, "investments")),
            Goal::Travel => Some((TRAVEL, "your travel fund")),
            Goal::Other(_) => None,
        })
    }
}

impl OptimizationFinder for GoalOptimizer {
    fn id(&self) -> OptimizationKind {
        OptimizationKind::Goal
    }

    fn name(&self) -> &'static str {
        "Goal Funding"
    }

    fn find(&self, ctx: &OptimizationContext<'_>) -> Result<Vec<Optimization>> {
        let Some((goal_category, goal_label)) = Self::target(ctx.goals) else {
            return Ok(vec![]);
        };

        let mut found = Vec::new();
        for (category, record) in ctx.records {
            if record.reason != VelocityReason::WellUnderBudget || category == goal_category {
                continue;
            }
            let unspent = record.budget - record.recommended_amount;
            if unspent <= 0.0 {
                continue;
            }
            found.push(Optimization {
                kind: OptimizationKind::Goal,
                category: category.clone(),
                title: format!("Redirect unspent {}", category),
                description: format!(
                    "About {:.2} of the {} budget is likely to go unused; move it to {}",
                    unspent, category, goal_label
                ),
                monthly_amount: unspent,
            });
        }
        Ok(found)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
