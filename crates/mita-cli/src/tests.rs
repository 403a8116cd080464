//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use mita_core::{EngineConfig, Goal, IncomeTier, RecommendationEngine};
use tempfile::TempDir;

use crate::cli::{PeriodArgs, SourceArgs};
use crate::commands;

fn engine() -> RecommendationEngine {
    RecommendationEngine::new(EngineConfig::embedded().unwrap())
}

fn write_json(dir: &TempDir, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
    path
}

fn middle_budget(dir: &TempDir) -> PathBuf {
    write_json(
        dir,
        "budget.json",
        serde_json::json!({
            "housing": 900.0,
            "food": 450.0,
            "transportation": 300.0,
            "entertainment": 300.0,
            "savings": 600.0,
            "other": 450.0
        }),
    )
}

fn period(budget: &Path, spent: Option<PathBuf>, remaining_days: Option<u32>) -> PeriodArgs {
    PeriodArgs {
        budget: budget.to_path_buf(),
        spent,
        remaining_days,
        as_of: None,
    }
}

// ========== Allocate Command Tests ==========

#[test]
fn test_allocate_with_tier() {
    let output = commands::run_allocate(&engine(), 3000.0, Some("middle")).unwrap();
    assert_eq!(output.tier, IncomeTier::Middle);
    assert_eq!(output.allocation.amount("housing"), 900.0);
    assert_eq!(output.allocation.amount("savings"), 600.0);
    assert!(output.allocation.sums_to(3000.0));
}

#[test]
fn test_allocate_classifies_income() {
    let output = commands::run_allocate(&engine(), 2500.0, None).unwrap();
    assert_eq!(output.tier, IncomeTier::Low);
}

#[test]
fn test_allocate_rejects_bad_input() {
    assert!(commands::run_allocate(&engine(), 0.0, None).is_err());
    assert!(commands::run_allocate(&engine(), 3000.0, Some("platinum")).is_err());
}

#[test]
fn test_cmd_allocate_prints() {
    assert!(commands::cmd_allocate(&engine(), 3000.0, None, false).is_ok());
    assert!(commands::cmd_allocate(&engine(), 3000.0, None, true).is_ok());
}

// ========== Recommend Command Tests ==========

#[test]
fn test_build_request_parses_arguments() {
    let goals = vec!["emergency_fund".to_string(), "travel".to_string()];
    let request =
        commands::build_request(6000.0, Some("upper-middle"), &goals, Some("Boston, MA".into()))
            .unwrap();

    assert_eq!(request.monthly_income, 6000.0);
    assert_eq!(request.tier, Some(IncomeTier::UpperMiddle));
    assert_eq!(request.goals, Some(vec![Goal::EmergencyFund, Goal::Travel]));
    assert_eq!(request.location.as_deref(), Some("Boston, MA"));
}

#[test]
fn test_build_request_ignores_blank_location() {
    let request = commands::build_request(6000.0, None, &[], Some("  ".into())).unwrap();
    assert!(request.goals.is_none());
    assert!(request.location.is_none());
}

#[test]
fn test_build_request_rejects_empty_goal() {
    let goals = vec!["travel".to_string(), "".to_string()];
    assert!(commands::build_request(6000.0, None, &goals, None).is_err());
}

#[tokio::test]
async fn test_cmd_recommend_offline() {
    let request = commands::build_request(4000.0, None, &[], None).unwrap();
    assert!(commands::cmd_recommend(&engine(), &request, false).await.is_ok());

    let bad = commands::build_request(-1.0, None, &[], None).unwrap();
    assert!(commands::cmd_recommend(&engine(), &bad, true).await.is_err());
}

#[test]
fn test_build_engine_with_snapshot() {
    let dir = TempDir::new().unwrap();
    let data = write_json(
        &dir,
        "snapshot.json",
        serde_json::json!({"profile": {"location": "Seattle, WA", "goals": ["travel"]}}),
    );

    let source = SourceArgs {
        data: Some(data),
        offline: false,
    };
    let engine = commands::build_engine(None, Some(&source)).unwrap();
    assert!(engine.source().is_some());

    let offline = SourceArgs {
        data: None,
        offline: true,
    };
    let engine = commands::build_engine(None, Some(&offline)).unwrap();
    assert!(engine.source().is_none());
}

#[test]
fn test_build_engine_missing_snapshot_fails() {
    let source = SourceArgs {
        data: Some(PathBuf::from("/nonexistent/snapshot.json")),
        offline: false,
    };
    assert!(commands::build_engine(None, Some(&source)).is_err());
}

// ========== Velocity Command Tests ==========

#[test]
fn test_velocity_on_track() {
    let dir = TempDir::new().unwrap();
    let budget = write_json(&dir, "budget.json", serde_json::json!({"entertainment": 300.0}));
    let spent = write_json(&dir, "spent.json", serde_json::json!({"entertainment": 150.0}));

    let (_, records) =
        commands::run_velocity(&engine(), &period(&budget, Some(spent), Some(15))).unwrap();
    let r = &records["entertainment"];
    assert_eq!(r.velocity, 1.0);
    assert!(!r.needs_adjustment);
}

#[test]
fn test_velocity_with_calendar_date() {
    let dir = TempDir::new().unwrap();
    let budget = write_json(&dir, "budget.json", serde_json::json!({"food": 310.0}));
    let spent = write_json(&dir, "spent.json", serde_json::json!({"food": 100.0}));

    let mut args = period(&budget, Some(spent), None);
    args.as_of = Some("2024-01-10".to_string());

    // January: 31 days, 10 passed, 10/day against a 10/day budget
    let (_, records) = commands::run_velocity(&engine(), &args).unwrap();
    assert!((records["food"].velocity - 1.0).abs() < 1e-9);
}

#[test]
fn test_velocity_requires_period() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);
    assert!(commands::run_velocity(&engine(), &period(&budget, None, None)).is_err());
    assert!(commands::run_velocity(&engine(), &period(&budget, None, Some(40))).is_err());
}

#[test]
fn test_velocity_rejects_bad_files() {
    let dir = TempDir::new().unwrap();
    let negative = write_json(&dir, "neg.json", serde_json::json!({"food": -10.0}));
    assert!(commands::run_velocity(&engine(), &period(&negative, None, Some(10))).is_err());

    let empty = write_json(&dir, "empty.json", serde_json::json!({}));
    assert!(commands::run_velocity(&engine(), &period(&empty, None, Some(10))).is_err());

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    assert!(commands::run_velocity(&engine(), &period(&garbage, None, Some(10))).is_err());
}

// ========== Redistribute Command Tests ==========

#[tokio::test]
async fn test_redistribute_mid_month() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);
    let spent = write_json(
        &dir,
        "spent.json",
        serde_json::json!({
            "housing": 450.0,
            "food": 400.0,
            "transportation": 150.0,
            "entertainment": 30.0,
            "savings": 300.0,
            "other": 225.0
        }),
    );

    let output = commands::run_redistribute(&engine(), 3000.0, &period(&budget, Some(spent), Some(15)))
        .await
        .unwrap();

    assert_eq!(output.velocity.len(), 6);
    assert_eq!(output.plan.adjustments.len(), 2);
    assert_eq!(output.plan.transfers.len(), 1);
    assert_eq!(output.plan.transfers[0].from, "entertainment");
    assert_eq!(output.plan.transfers[0].to, "food");
    assert!((output.plan.transfers[0].amount - 117.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_redistribute_start_of_month() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);

    let output = commands::run_redistribute(&engine(), 3000.0, &period(&budget, None, Some(30)))
        .await
        .unwrap();
    assert!(output.plan.is_empty());
    assert!(commands::cmd_redistribute(&engine(), 3000.0, &period(&budget, None, Some(30)), false)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_redistribute_rejects_bad_income() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);
    let result = commands::run_redistribute(&engine(), 0.0, &period(&budget, None, Some(15))).await;
    assert!(result.is_err());
}

// ========== Daily Command Tests ==========

#[test]
fn test_daily_for_month() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);

    let output = commands::run_daily(&budget, Some("2024-06"), None, None).unwrap();
    assert_eq!(output.days.len(), 30);
    assert!((output.days[0].total - 100.0).abs() < 1e-9);
    assert!(output.remaining.is_none());
}

#[test]
fn test_daily_remaining_budget() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);
    let spent = write_json(&dir, "spent.json", serde_json::json!({"food": 350.0}));

    let output = commands::run_daily(&budget, None, Some("2024-06-21"), Some(spent.as_path())).unwrap();
    assert_eq!(output.days.len(), 30);
    let remaining = output.remaining.unwrap();
    assert!((remaining.categories.amount("food") - 10.0).abs() < 1e-9);
}

#[test]
fn test_daily_rejects_bad_arguments() {
    let dir = TempDir::new().unwrap();
    let budget = middle_budget(&dir);
    let spent = write_json(&dir, "spent.json", serde_json::json!({"food": 1.0}));

    assert!(commands::run_daily(&budget, Some("2024-13"), None, None).is_err());
    assert!(commands::run_daily(&budget, Some("June"), None, None).is_err());
    assert!(commands::run_daily(&budget, Some("2024-06"), None, Some(spent.as_path())).is_err());
    assert!(commands::run_daily(&budget, None, Some("2024/06/21"), None).is_err());
}

// ========== Config Command Tests ==========

#[test]
fn test_config_init_writes_loadable_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("budget.toml");

    let written = commands::run_config_init(Some(path.as_path()), false).unwrap();
    assert_eq!(written, path);
    assert!(path.exists());

    let loaded = EngineConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(loaded, EngineConfig::embedded().unwrap());

    // Refuses to clobber without --force
    assert!(commands::run_config_init(Some(path.as_path()), false).is_err());
    assert!(commands::run_config_init(Some(path.as_path()), true).is_ok());
}

#[test]
fn test_config_show_with_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.toml");
    std::fs::write(&path, "[redistribution]\nsurplus_cap = 0.25\n").unwrap();

    assert!(commands::cmd_config_show(Some(path.as_path()), false).is_ok());
    assert!(commands::cmd_config_show(Some(path.as_path()), true).is_ok());

    let engine = commands::build_engine(Some(path.as_path()), None).unwrap();
    assert_eq!(engine.config().redistribution.surplus_cap, 0.25);
}

#[test]
fn test_config_show_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.toml");
    std::fs::write(&path, "[velocity]\nover_threshold = \"high\"\n").unwrap();

    assert!(commands::cmd_config_show(Some(path.as_path()), false).is_err());
}

#[test]
fn test_parse_helpers() {
    assert_eq!(commands::parse_month("2024-02").unwrap(), (2024, 2));
    assert!(commands::parse_date("2024-02-30").is_err());
    assert_eq!(commands::money(1234.5), "$1234.50");
}
