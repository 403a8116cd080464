//! Spending velocity monitor
//!
//! Projects month-to-date spending to the end of the period and flags
//! categories trending over or under their budget.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::CategoryAllocation;
use crate::calendar::days_in_month;
use crate::config::VelocityConfig;

/// Why a category was (or was not) flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityReason {
    SignificantlyOverBudget,
    TrendingOverBudget,
    WellUnderBudget,
    OnTrack,
    /// Spending in a category with no budget
    Unbudgeted,
    /// No days elapsed, or nothing budgeted and nothing spent
    InsufficientData,
}

impl VelocityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignificantlyOverBudget => "significantly_over_budget",
            Self::TrendingOverBudget => "trending_over_budget",
            Self::WellUnderBudget => "well_under_budget",
            Self::OnTrack => "on_track",
            Self::Unbudgeted => "unbudgeted",
            Self::InsufficientData => "insufficient_data",
        }
    }

    /// Human-readable explanation
    pub fn description(&self) -> &'static str {
        match self {
            Self::SignificantlyOverBudget => "Spending significantly above budget",
            Self::TrendingOverBudget => "Spending trending over budget",
            Self::WellUnderBudget => "Well under budget, consider reallocation",
            Self::OnTrack => "On track",
            Self::Unbudgeted => "Spending in a category with no budget",
            Self::InsufficientData => "Not enough data yet",
        }
    }
}

impl fmt::Display for VelocityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VelocityReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "significantly_over_budget" => Ok(Self::SignificantlyOverBudget),
            "trending_over_budget" => Ok(Self::TrendingOverBudget),
            "well_under_budget" => Ok(Self::WellUnderBudget),
            "on_track" => Ok(Self::OnTrack),
            "unbudgeted" => Ok(Self::Unbudgeted),
            "insufficient_data" => Ok(Self::InsufficientData),
            _ => Err(format!("Unknown velocity reason: {}", s)),
        }
    }
}

/// How soon a flagged category needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown urgency: {}", s)),
        }
    }
}

/// Velocity analysis for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityRecord {
    pub budget: f64,
    pub spent: f64,
    pub daily_budget: f64,
    pub actual_daily_rate: f64,
    pub projected_monthly: f64,
    /// Projected spend over budget
    pub velocity: f64,
    pub needs_adjustment: bool,
    pub recommended_amount: f64,
    pub reason: VelocityReason,
    pub confidence: f64,
    pub urgency: Urgency,
}

/// Confidence in a projection after `days_passed` days
pub fn confidence_for(days_passed: u32) -> f64 {
    if days_passed < 7 {
        0.4
    } else if days_passed <= 15 {
        0.7
    } else {
        0.9
    }
}

/// Computes velocity records over a fixed-length period
#[derive(Debug, Clone)]
pub struct VelocityMonitor {
    period_days: u32,
    config: VelocityConfig,
}

impl VelocityMonitor {
    /// Monitor over the configured period (30 days by default)
    pub fn new(config: &VelocityConfig) -> Self {
        Self {
            period_days: config.period_days.max(1),
            config: config.clone(),
        }
    }

    /// Monitor over the calendar month containing `date`
    pub fn for_month(config: &VelocityConfig, date: NaiveDate) -> Self {
        Self {
            period_days: days_in_month(date.year(), date.month()),
            config: config.clone(),
        }
    }

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    /// Velocity for every budgeted or spent category
    ///
    /// Categories spent against but absent from the budget are reported with
    /// a zero budget.
    pub fn compute_velocity(
        &self,
        budget: &CategoryAllocation,
        spent: &BTreeMap<String, f64>,
        remaining_days: u32,
    ) -> BTreeMap<String, VelocityRecord> {
        let days_passed = self.period_days.saturating_sub(remaining_days);

        let mut records = BTreeMap::new();
        for (category, amount) in budget.iter() {
            let spent_amount = spent.get(category).copied().unwrap_or(0.0);
            records.insert(
                category.to_string(),
                self.record(amount, spent_amount, days_passed),
            );
        }
        for (category, &spent_amount) in spent {
            if !budget.contains(category) {
                records.insert(category.clone(), self.record(0.0, spent_amount, days_passed));
            }
        }

        debug!(
            categories = records.len(),
            days_passed,
            flagged = records.values().filter(|r| r.needs_adjustment).count(),
            "Computed spending velocity"
        );
        records
    }

    /// Velocity for a single category
    pub fn record(&self, budget: f64, spent: f64, days_passed: u32) -> VelocityRecord {
        let period = self.period_days as f64;
        let daily_budget = budget / period;
        let actual_daily_rate = if days_passed > 0 {
            spent / days_passed as f64
        } else {
            0.0
        };
        let projected_monthly = actual_daily_rate * period;
        let confidence = confidence_for(days_passed);

        if days_passed > 0 && budget <= 0.0 && spent > 0.0 {
            return VelocityRecord {
                budget,
                spent,
                daily_budget,
                actual_daily_rate,
                projected_monthly,
                velocity: 0.0,
                needs_adjustment: true,
                recommended_amount: projected_monthly * self.config.recommendation_buffer,
                reason: VelocityReason::Unbudgeted,
                confidence,
                urgency: Urgency::Medium,
            };
        }

        if days_passed == 0 || budget <= 0.0 {
            return VelocityRecord {
                budget,
                spent,
                daily_budget,
                actual_daily_rate,
                projected_monthly,
                velocity: 0.0,
                needs_adjustment: false,
                recommended_amount: budget,
                reason: VelocityReason::InsufficientData,
                confidence,
                urgency: Urgency::Low,
            };
        }

        let c = &self.config;
        let velocity = projected_monthly / budget;
        let needs_adjustment = velocity > c.over_threshold || velocity < c.under_threshold;
        let recommended_amount = if needs_adjustment {
            projected_monthly * c.recommendation_buffer
        } else {
            budget
        };

        let reason = if velocity > c.severe_threshold {
            VelocityReason::SignificantlyOverBudget
        } else if velocity > c.over_threshold {
            VelocityReason::TrendingOverBudget
        } else if velocity < c.under_threshold {
            VelocityReason::WellUnderBudget
        } else {
            VelocityReason::OnTrack
        };

        let urgency = if velocity > c.severe_threshold {
            Urgency::High
        } else if needs_adjustment {
            Urgency::Medium
        } else {
            Urgency::Low
        };

        VelocityRecord {
            budget,
            spent,
            daily_budget,
            actual_daily_rate,
            projected_monthly,
            velocity,
            needs_adjustment,
            recommended_amount,
            reason,
            confidence,
            urgency,
        }
    }
}

impl Default for VelocityMonitor {
    fn default() -> Self {
        Self::new(&VelocityConfig::default())
    }
}
