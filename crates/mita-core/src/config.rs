//! Engine configuration
//!
//! Weight tables, tier thresholds, velocity thresholds, location lists and
//! collaborator timeouts.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an override file (explicit path, else ~/.local/share/mita/config/budget.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default value.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::allocation::{CategoryAllocation, TOTAL_TOLERANCE};
use crate::error::{Error, Result};
use crate::models::IncomeTier;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/budget.toml");

/// Lower income bound of each tier above `Low`
#[derive(Debug, Clone, PartialEq)]
pub struct TierThresholds {
    pub lower_middle: f64,
    pub middle: f64,
    pub upper_middle: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            lower_middle: 3000.0,
            middle: 4500.0,
            upper_middle: 7000.0,
            high: 12000.0,
        }
    }
}

impl TierThresholds {
    /// Classify a monthly income
    pub fn classify(&self, income: f64) -> IncomeTier {
        if income >= self.high {
            IncomeTier::High
        } else if income >= self.upper_middle {
            IncomeTier::UpperMiddle
        } else if income >= self.middle {
            IncomeTier::Middle
        } else if income >= self.lower_middle {
            IncomeTier::LowerMiddle
        } else {
            IncomeTier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VelocityConfig {
    pub period_days: u32,
    pub over_threshold: f64,
    pub severe_threshold: f64,
    pub under_threshold: f64,
    pub recommendation_buffer: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            period_days: 30,
            over_threshold: 1.2,
            severe_threshold: 1.5,
            under_threshold: 0.5,
            recommendation_buffer: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedistributionConfig {
    /// Share of a donor's surplus that may be transferred
    pub surplus_cap: f64,
}

impl Default for RedistributionConfig {
    fn default() -> Self {
        Self { surplus_cap: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationConfig {
    pub high_cost: Vec<String>,
    pub low_cost: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorConfig {
    pub timeout: Duration,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub tiers: TierThresholds,
    /// Category weights per tier; each table sums to 1.0
    pub weights: BTreeMap<IncomeTier, CategoryAllocation>,
    pub velocity: VelocityConfig,
    pub redistribution: RedistributionConfig,
    pub location: LocationConfig,
    pub collaborators: CollaboratorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let table = |w: [f64; 6]| -> CategoryAllocation {
            ["housing", "food", "transportation", "entertainment", "savings", "other"]
                .into_iter()
                .zip(w)
                .collect()
        };

        let mut weights = BTreeMap::new();
        weights.insert(IncomeTier::Low, table([0.40, 0.20, 0.12, 0.05, 0.10, 0.13]));
        weights.insert(
            IncomeTier::LowerMiddle,
            table([0.35, 0.17, 0.11, 0.07, 0.15, 0.15]),
        );
        weights.insert(IncomeTier::Middle, table([0.30, 0.15, 0.10, 0.10, 0.20, 0.15]));
        weights.insert(
            IncomeTier::UpperMiddle,
            table([0.28, 0.12, 0.10, 0.10, 0.25, 0.15]),
        );
        weights.insert(IncomeTier::High, table([0.25, 0.10, 0.08, 0.10, 0.32, 0.15]));

        Self {
            tiers: TierThresholds::default(),
            weights,
            velocity: VelocityConfig::default(),
            redistribution: RedistributionConfig::default(),
            location: LocationConfig {
                high_cost: ["san francisco", "new york", "los angeles", "boston", "seattle"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                low_cost: ["memphis", "oklahoma city", "tulsa", "wichita"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            collaborators: CollaboratorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load the override file if present, else the embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let content = match path {
            Some(ref p) if p.exists() => fs::read_to_string(p)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?,
            _ => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Weight table for a tier
    pub fn weights_for(&self, tier: IncomeTier) -> Option<&CategoryAllocation> {
        self.weights.get(&tier)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let t = &self.tiers;
        let ascending = 0.0 < t.lower_middle
            && t.lower_middle < t.middle
            && t.middle < t.upper_middle
            && t.upper_middle < t.high;
        if !ascending {
            return Err(Error::Config(
                "Tier thresholds must be positive and strictly ascending".to_string(),
            ));
        }

        for tier in IncomeTier::all() {
            let table = self
                .weights
                .get(tier)
                .ok_or_else(|| Error::Config(format!("Missing weights for tier {}", tier)))?;
            if table.is_empty() || !table.is_well_formed() {
                return Err(Error::Config(format!(
                    "Weights for tier {} must be non-empty and non-negative",
                    tier
                )));
            }
            if (table.total() - 1.0).abs() > TOTAL_TOLERANCE {
                return Err(Error::Config(format!(
                    "Weights for tier {} sum to {:.6}, expected 1.0",
                    tier,
                    table.total()
                )));
            }
        }

        let v = &self.velocity;
        if v.period_days == 0 {
            return Err(Error::Config("velocity.period_days must be > 0".to_string()));
        }
        if !(v.under_threshold < v.over_threshold && v.over_threshold <= v.severe_threshold) {
            return Err(Error::Config(
                "Velocity thresholds must satisfy under < over <= severe".to_string(),
            ));
        }
        if v.recommendation_buffer <= 0.0 {
            return Err(Error::Config(
                "velocity.recommendation_buffer must be > 0".to_string(),
            ));
        }

        let cap = self.redistribution.surplus_cap;
        if !(cap > 0.0 && cap <= 1.0) {
            return Err(Error::Config(
                "redistribution.surplus_cap must be in (0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("mita").join("config").join("budget.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    tiers: Option<RawTiers>,
    weights: Option<HashMap<String, BTreeMap<String, f64>>>,
    velocity: Option<RawVelocity>,
    redistribution: Option<RawRedistribution>,
    location: Option<RawLocation>,
    collaborators: Option<RawCollaborators>,
}

#[derive(Debug, Deserialize)]
struct RawTiers {
    lower_middle: Option<f64>,
    middle: Option<f64>,
    upper_middle: Option<f64>,
    high: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawVelocity {
    period_days: Option<u32>,
    over_threshold: Option<f64>,
    severe_threshold: Option<f64>,
    under_threshold: Option<f64>,
    recommendation_buffer: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRedistribution {
    surplus_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    high_cost: Option<Vec<String>>,
    low_cost: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawCollaborators {
    timeout_secs: Option<u64>,
}

/// Parse config from TOML content and validate it
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(tiers) = raw.tiers {
        let t = &mut config.tiers;
        t.lower_middle = tiers.lower_middle.unwrap_or(t.lower_middle);
        t.middle = tiers.middle.unwrap_or(t.middle);
        t.upper_middle = tiers.upper_middle.unwrap_or(t.upper_middle);
        t.high = tiers.high.unwrap_or(t.high);
    }

    if let Some(weights) = raw.weights {
        for (tier_name, table) in weights {
            let tier: IncomeTier = match tier_name.parse() {
                Ok(t) => t,
                Err(e) => {
                    warn!(tier = %tier_name, error = %e, "Skipping weights for unknown tier");
                    continue;
                }
            };
            config.weights.insert(tier, CategoryAllocation::from(table));
        }
    }

    if let Some(velocity) = raw.velocity {
        let v = &mut config.velocity;
        v.period_days = velocity.period_days.unwrap_or(v.period_days);
        v.over_threshold = velocity.over_threshold.unwrap_or(v.over_threshold);
        v.severe_threshold = velocity.severe_threshold.unwrap_or(v.severe_threshold);
        v.under_threshold = velocity.under_threshold.unwrap_or(v.under_threshold);
        v.recommendation_buffer = velocity
            .recommendation_buffer
            .unwrap_or(v.recommendation_buffer);
    }

    if let Some(redistribution) = raw.redistribution {
        if let Some(cap) = redistribution.surplus_cap {
            config.redistribution.surplus_cap = cap;
        }
    }

    if let Some(location) = raw.location {
        if let Some(high) = location.high_cost {
            config.location.high_cost = high;
        }
        if let Some(low) = location.low_cost {
            config.location.low_cost = low;
        }
    }

    if let Some(collaborators) = raw.collaborators {
        if let Some(secs) = collaborators.timeout_secs {
            config.collaborators.timeout = Duration::from_secs(secs);
        }
    }

    config.validate()?;
    Ok(config)
}
