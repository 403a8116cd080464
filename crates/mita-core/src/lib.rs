//! MITA Core Library
//!
//! Budget allocation and redistribution engine for the MITA personal finance app:
//! - Income tiers and per-tier weight tables
//! - Base allocation with optional backend override
//! - Adjustment chain (behavioral, history, peer, goals, location)
//! - Spending velocity monitoring
//! - Redistribution of surplus between categories
//! - Daily budget calendar
//! - Personalized recommendations with advice
//! - Pluggable data collaborators (HTTP backend, JSON snapshot, mock)

pub mod adjust;
pub mod advice;
pub mod allocation;
pub mod allocator;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod recommendation;
pub mod redistribute;
pub mod sources;
pub mod velocity;

/// Test utilities including a mock backend server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adjust::{
    Adjusted, Adjuster, AdjustmentContext, AdjustmentStage, StageReport, StageStatus,
};
pub use advice::{Advice, AdviceContext, AdvicePanel, Advisor};
pub use allocation::CategoryAllocation;
pub use allocator::{AllocationSource, Allocator};
pub use calendar::{
    daily_budgets, days_in_month, days_remaining_after, remaining_daily_budget, DailyBudget,
};
pub use config::{default_config_path, EngineConfig, DEFAULT_CONFIG};
pub use error::{Error, Result};
pub use models::{
    BehaviorProfile, BehaviorTrait, BudgetStyle, Goal, IncomeTier, PeerData, PeerStat,
    SpendingHistory, SpendingPersonality, UserProfile,
};
pub use recommendation::{BudgetRecommendation, RecommendationEngine, RecommendationRequest};
pub use redistribute::{
    BudgetAdjustment, CategoryAdjustment, Optimization, OptimizationFinder, OptimizationKind,
    Redistributor, Transfer,
};
pub use sources::{BudgetDataSource, DataClient, DataSnapshot, MockDataSource};
pub use velocity::{Urgency, VelocityMonitor, VelocityReason, VelocityRecord};
