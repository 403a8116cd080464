//! Domain models for MITA

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Well-known category names used by the weight tables and adjustment stages
pub mod categories {
    pub const HOUSING: &str = "housing";
    pub const FOOD: &str = "food";
    pub const TRANSPORTATION: &str = "transportation";
    pub const ENTERTAINMENT: &str = "entertainment";
    pub const SHOPPING: &str = "shopping";
    pub const SAVINGS: &str = "savings";
    pub const DEBT: &str = "debt";
    pub const INVESTMENTS: &str = "investments";
    pub const TRAVEL: &str = "travel";
    pub const OTHER: &str = "other";
}

/// Income bracket used to select default allocation weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeTier {
    Low,
    LowerMiddle,
    Middle,
    UpperMiddle,
    High,
}

impl IncomeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::LowerMiddle => "lower_middle",
            Self::Middle => "middle",
            Self::UpperMiddle => "upper_middle",
            Self::High => "high",
        }
    }

    /// All tiers, lowest first
    pub fn all() -> &'static [IncomeTier] {
        &[
            Self::Low,
            Self::LowerMiddle,
            Self::Middle,
            Self::UpperMiddle,
            Self::High,
        ]
    }
}

impl std::str::FromStr for IncomeTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "low" => Ok(Self::Low),
            "lower_middle" | "lowermiddle" => Ok(Self::LowerMiddle),
            "middle" => Ok(Self::Middle),
            "upper_middle" | "uppermiddle" => Ok(Self::UpperMiddle),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown income tier: {}", s)),
        }
    }
}

impl std::fmt::Display for IncomeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall spending personality reported by the behavioral analysis collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpendingPersonality {
    Conservative,
    Aggressive,
    Inconsistent,
    #[default]
    Balanced,
    /// Any tag this engine has no multipliers for
    #[serde(other)]
    Unknown,
}

impl SpendingPersonality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
            Self::Inconsistent => "inconsistent",
            Self::Balanced => "balanced",
            Self::Unknown => "unknown",
        }
    }
}

/// Individual behavior trait tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorTrait {
    WeekendOverspending,
    ImpulseBuying,
    GoalOriented,
    #[serde(other)]
    Unknown,
}

/// Behavioral analysis of the user's spending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    #[serde(default)]
    pub spending_personality: SpendingPersonality,
    #[serde(default)]
    pub key_traits: BTreeSet<BehaviorTrait>,
}

impl BehaviorProfile {
    pub fn new(personality: SpendingPersonality) -> Self {
        Self {
            spending_personality: personality,
            key_traits: BTreeSet::new(),
        }
    }

    pub fn with_trait(mut self, t: BehaviorTrait) -> Self {
        self.key_traits.insert(t);
        self
    }

    pub fn has_trait(&self, t: BehaviorTrait) -> bool {
        self.key_traits.contains(&t)
    }

    /// Score in [0, 1] summarizing how well the behavior supports the budget (0.5 = neutral)
    pub fn score(&self) -> f64 {
        let mut score: f64 = 0.5;
        score += match self.spending_personality {
            SpendingPersonality::Conservative => 0.15,
            SpendingPersonality::Aggressive => -0.10,
            SpendingPersonality::Inconsistent => -0.15,
            SpendingPersonality::Balanced | SpendingPersonality::Unknown => 0.0,
        };
        for t in &self.key_traits {
            score += match t {
                BehaviorTrait::GoalOriented => 0.20,
                BehaviorTrait::ImpulseBuying => -0.15,
                BehaviorTrait::WeekendOverspending => -0.10,
                BehaviorTrait::Unknown => 0.0,
            };
        }
        score.clamp(0.0, 1.0)
    }
}

/// Amount actually spent per category in a reference period
pub type SpendingHistory = BTreeMap<String, f64>;

/// Peer statistics for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerStat {
    pub peer_average: f64,
}

/// Peer comparison keyed by category
pub type PeerData = BTreeMap<String, PeerStat>;

/// Financial goal tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    EmergencyFund,
    Savings,
    DebtPayoff,
    Investment,
    Travel,
    HomePurchase,
    /// Tag with no associated boost; carried through but ignored
    #[serde(untagged)]
    Other(String),
}

impl Goal {
    pub fn as_str(&self) -> &str {
        match self {
            Self::EmergencyFund => "emergency_fund",
            Self::Savings => "savings",
            Self::DebtPayoff => "debt_payoff",
            Self::Investment => "investment",
            Self::Travel => "travel",
            Self::HomePurchase => "home_purchase",
            Self::Other(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl std::str::FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let goal = match s.trim().to_lowercase().replace('-', "_").as_str() {
            "emergency_fund" => Self::EmergencyFund,
            "savings" => Self::Savings,
            "debt_payoff" => Self::DebtPayoff,
            "investment" => Self::Investment,
            "travel" => Self::Travel,
            "home_purchase" => Self::HomePurchase,
            "" => return Err("Empty goal tag".to_string()),
            other => Self::Other(other.to_string()),
        };
        Ok(goal)
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User profile as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Budgeting style reported alongside a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStyle {
    Balanced,
    Conservative,
    Aggressive,
    Flexible,
}

impl BudgetStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
            Self::Flexible => "flexible",
        }
    }

    pub fn from_behavior(profile: Option<&BehaviorProfile>) -> Self {
        match profile.map(|p| p.spending_personality) {
            Some(SpendingPersonality::Conservative) => Self::Conservative,
            Some(SpendingPersonality::Aggressive) => Self::Aggressive,
            Some(SpendingPersonality::Inconsistent) => Self::Flexible,
            _ => Self::Balanced,
        }
    }
}

impl std::fmt::Display for BudgetStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
