//! Adjuster - personalizes a base allocation
//!
//! The adjuster runs a chain of named stages over a base allocation. Each
//! stage multiplies or blends some categories using one kind of context and
//! then renormalizes so the allocation still sums to the monthly income.
//!
//! ## Built-in stages (in order)
//!
//! - **Behavioral** - spending personality and trait multipliers
//! - **History** - blends actual historical spending shares into the weights
//! - **Peer** - nudges outliers toward peer averages
//! - **Goals** - boosts categories that serve the user's goals
//! - **Location** - cost-of-living multipliers
//!
//! A stage with no context is the identity. A stage that fails is logged and
//! skipped; the chain always produces a usable allocation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mita_core::adjust::{Adjuster, AdjustmentContext};
//!
//! let adjuster = Adjuster::new(&config);
//! let ctx = AdjustmentContext::new(income).with_location("Boston, MA");
//! let adjusted = adjuster.apply(&base, &ctx);
//! ```

mod behavioral;
mod goals;
mod history;
mod location;
mod peer;

pub use behavioral::BehavioralStage;
pub use goals::GoalsStage;
pub use history::HistoryStage;
pub use location::{CostOfLiving, LocationStage};
pub use peer::PeerStage;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocation::CategoryAllocation;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{BehaviorProfile, Goal, PeerData, SpendingHistory};

/// Inputs available to adjustment stages
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentContext<'a> {
    /// Monthly income; every stage renormalizes to this total
    pub income: f64,
    pub behavior: Option<&'a BehaviorProfile>,
    pub history: Option<&'a SpendingHistory>,
    pub peers: Option<&'a PeerData>,
    pub goals: &'a [Goal],
    pub location: Option<&'a str>,
}

impl<'a> AdjustmentContext<'a> {
    /// Context with no personalization data
    pub fn new(income: f64) -> Self {
        Self {
            income,
            behavior: None,
            history: None,
            peers: None,
            goals: &[],
            location: None,
        }
    }

    pub fn with_behavior(mut self, behavior: Option<&'a BehaviorProfile>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_history(mut self, history: Option<&'a SpendingHistory>) -> Self {
        self.history = history;
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

    pub fn with_location(mut self, location: &'a str) -> Self {
        self.location = Some(location);
        self
    }
}

/// One transform in the adjustment chain
pub trait AdjustmentStage: Send + Sync {
    /// Unique identifier for this stage
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Produce the adjusted allocation. Must return the input unchanged when
    /// the context holds nothing for this stage.
    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation>;
}

/// What happened in one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub status: StageStatus,
}

/// Result of running the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjusted {
    pub allocation: CategoryAllocation,
    pub stages: Vec<StageReport>,
}

impl Adjusted {
    /// Ids of the stages that modified the allocation
    pub fn applied(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|r| r.status == StageStatus::Applied)
            .map(|r| r.stage.as_str())
            .collect()
    }
}

/// The adjustment chain
pub struct Adjuster {
    stages: Vec<Box<dyn AdjustmentStage>>,
}

impl Adjuster {
    /// Create an adjuster with the built-in stages in their standard order
    pub fn new(config: &EngineConfig) -> Self {
        let mut adjuster = Self::empty();

        adjuster.register(Box::new(BehavioralStage));
        adjuster.register(Box::new(HistoryStage));
        adjuster.register(Box::new(PeerStage));
        adjuster.register(Box::new(GoalsStage));
        adjuster.register(Box::new(LocationStage::new(&config.location)));

        adjuster
    }

    /// Create an adjuster with no stages
    pub fn empty() -> Self {
        Self { stages: vec![] }
    }

    /// Append a stage to the chain
    pub fn register(&mut self, stage: Box<dyn AdjustmentStage>) {
        self.stages.push(stage);
    }

    /// Ids of the registered stages, in order
    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    /// Run every stage over `base`
    pub fn apply(&self, base: &CategoryAllocation, ctx: &AdjustmentContext<'_>) -> Adjusted {
        let mut allocation = base.clone();
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let status = match stage.adjust(&allocation, ctx) {
                Ok(next) if next == allocation => StageStatus::Unchanged,
                Ok(next) if !next.is_well_formed() => {
                    warn!(stage = stage.id(), "Stage produced invalid amounts, skipping");
                    StageStatus::Failed("stage produced invalid amounts".to_string())
                }
                Ok(next) => {
                    allocation = next;
                    StageStatus::Applied
                }
                Err(e) => {
                    warn!(stage = stage.id(), error = %e, "Adjustment stage failed, skipping");
                    StageStatus::Failed(e.to_string())
                }
            };
            debug!(stage = stage.id(), status = ?status, "Adjustment stage complete");
            reports.push(StageReport {
                stage: stage.id().to_string(),
                status,
            });
        }

        Adjusted {
            allocation,
            stages: reports,
        }
    }
}
