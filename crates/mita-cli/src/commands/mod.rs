//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Allocation, recommendation and daily calendar commands
//! - `config` - Configuration show/path/init
//! - `serve` - Web server command
//! - `velocity` - Velocity and redistribution commands
//!
//! Shared helpers for engine setup and input files live here.

pub mod budget;
pub mod config;
pub mod serve;
pub mod velocity;

// Re-export command functions for main.rs
pub use budget::*;
pub use config::*;
pub use serve::*;
pub use velocity::*;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::cli::SourceArgs;
use mita_core::{
    BudgetDataSource, CategoryAllocation, DataClient, EngineConfig, Goal, IncomeTier,
    RecommendationEngine, RecommendationRequest,
};

/// Build the engine from config and, when requested, a collaborator
///
/// `source` is `None` for commands that never consult collaborator data.
pub fn build_engine(config_path: Option<&Path>, source: Option<&SourceArgs>) -> Result<RecommendationEngine> {
    let config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    let engine = RecommendationEngine::new(config);

    let Some(source) = source else {
        return Ok(engine);
    };
    if source.offline {
        return Ok(engine);
    }

    let client = match source.data {
        Some(ref path) => Some(
            DataClient::snapshot_file(path)
                .with_context(|| format!("Failed to load data snapshot {}", path.display()))?,
        ),
        None => DataClient::from_env(),
    };

    match client {
        Some(client) => {
            info!(host = client.host(), "Using data collaborator");
            Ok(engine.with_source(client))
        }
        None => Ok(engine),
    }
}

/// Parse an income tier argument
pub fn parse_tier(tier: Option<&str>) -> Result<Option<IncomeTier>> {
    tier.map(|t| t.parse::<IncomeTier>().map_err(|e| anyhow!(e)))
        .transpose()
}

/// Assemble a recommendation request from command-line arguments
pub fn build_request(
    income: f64,
    tier: Option<&str>,
    goals: &[String],
    location: Option<String>,
) -> Result<RecommendationRequest> {
    let mut request = RecommendationRequest::new(income);
    if let Some(tier) = parse_tier(tier)? {
        request = request.with_tier(tier);
    }
    if !goals.is_empty() {
        let goals = goals
            .iter()
            .map(|g| g.parse::<Goal>().map_err(|e| anyhow!(e)))
            .collect::<Result<Vec<_>>>()?;
        request = request.with_goals(goals);
    }
    if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
        request = request.with_location(location);
    }
    Ok(request)
}

/// Read and parse a JSON input file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Read a budget file, rejecting empty or malformed allocations
pub fn read_budget(path: &Path) -> Result<CategoryAllocation> {
    let budget: CategoryAllocation = read_json(path)?;
    if budget.is_empty() {
        anyhow::bail!("Budget {} has no categories", path.display());
    }
    if !budget.is_well_formed() {
        anyhow::bail!(
            "Budget {} has negative or non-finite amounts",
            path.display()
        );
    }
    Ok(budget)
}

/// Read an optional spent-so-far file; absent means nothing spent
pub fn read_spent(path: Option<&Path>) -> Result<BTreeMap<String, f64>> {
    let Some(path) = path else {
        return Ok(BTreeMap::new());
    };
    let spent: BTreeMap<String, f64> = read_json(path)?;
    if let Some((category, amount)) = spent.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        anyhow::bail!(
            "Spent amount for '{}' must be non-negative, got {}",
            category,
            amount
        );
    }
    Ok(spent)
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse a YYYY-MM month
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((date.year(), date.month()))
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a currency amount
pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}
