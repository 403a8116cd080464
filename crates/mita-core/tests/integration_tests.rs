//! Integration tests for mita-core
//!
//! These tests exercise the allocate → adjust → velocity → redistribute workflow.

use std::collections::BTreeMap;

use mita_core::{
    adjust::{AdjustmentStage, BehavioralStage, GoalsStage, HistoryStage, LocationStage, PeerStage},
    calendar::{daily_budgets, remaining_daily_budget},
    config::parse_config,
    models::PeerStat,
    sources::SnapshotSource,
    Adjuster, AdjustmentContext, BehaviorProfile, CategoryAllocation, DataClient, DataSnapshot,
    EngineConfig, Goal, IncomeTier, RecommendationEngine, RecommendationRequest, Redistributor,
    SpendingPersonality, Urgency, VelocityMonitor, VelocityReason,
};

fn config() -> EngineConfig {
    EngineConfig::embedded().expect("embedded config must parse")
}

fn middle_3000() -> CategoryAllocation {
    let engine = RecommendationEngine::new(config());
    engine
        .allocate(3000.0, Some(IncomeTier::Middle))
        .expect("valid income")
}

// =============================================================================
// Allocation
// =============================================================================

#[test]
fn test_allocate_middle_tier() {
    let allocation = middle_3000();

    let expected = [
        ("housing", 900.0),
        ("food", 450.0),
        ("transportation", 300.0),
        ("entertainment", 300.0),
        ("savings", 600.0),
        ("other", 450.0),
    ];
    assert_eq!(allocation.len(), expected.len());
    for (category, amount) in expected {
        assert!(
            (allocation.amount(category) - amount).abs() < 1e-9,
            "{} should be {}",
            category,
            amount
        );
    }
    assert!(allocation.sums_to(3000.0));
}

#[test]
fn test_allocation_conserves_income_for_every_tier() {
    let engine = RecommendationEngine::new(config());
    for income in [0.01, 850.0, 3000.0, 4499.99, 12345.67, 1_000_000.0] {
        for tier in IncomeTier::all() {
            let allocation = engine.allocate(income, Some(*tier)).unwrap();
            assert!(allocation.sums_to(income), "{} / {}", income, tier);
        }
    }
}

#[test]
fn test_non_positive_income_rejected() {
    let engine = RecommendationEngine::new(config());
    assert!(engine.allocate(0.0, None).unwrap_err().is_fatal());
    assert!(engine.allocate(-5.0, None).unwrap_err().is_fatal());
}

// =============================================================================
// Adjustment chain
// =============================================================================

#[test]
fn test_stages_are_identity_without_context() {
    let base = middle_3000();
    let ctx = AdjustmentContext::new(3000.0);
    let location = LocationStage::new(&config().location);
    let stages: [&dyn AdjustmentStage; 5] = [
        &BehavioralStage,
        &HistoryStage,
        &PeerStage,
        &GoalsStage,
        &location,
    ];

    for stage in stages {
        assert_eq!(stage.adjust(&base, &ctx).unwrap(), base, "{}", stage.id());
    }
}

#[test]
fn test_conservative_profile_shifts_toward_savings() {
    let base = middle_3000();
    let profile = BehaviorProfile::new(SpendingPersonality::Conservative);
    let ctx = AdjustmentContext::new(3000.0).with_behavior(Some(&profile));

    let adjusted = BehavioralStage.adjust(&base, &ctx).unwrap();
    assert!(adjusted.sums_to(3000.0));
    let ratio = adjusted.amount("savings") / adjusted.amount("entertainment");
    assert!((ratio - 690.0 / 255.0).abs() < 1e-9);
}

#[test]
fn test_location_stage_examples() {
    let base = middle_3000();
    let stage = LocationStage::new(&config().location);

    let sf = AdjustmentContext::new(3000.0).with_location("San Francisco, CA");
    let adjusted = stage.adjust(&base, &sf).unwrap();
    assert!(adjusted.sums_to(3000.0));
    // Housing grows relative to the untouched categories
    let before = base.amount("housing") / base.amount("savings");
    let after = adjusted.amount("housing") / adjusted.amount("savings");
    assert!((after / before - 1.25).abs() < 1e-9);

    let topeka = AdjustmentContext::new(3000.0).with_location("Topeka, KS");
    assert_eq!(stage.adjust(&base, &topeka).unwrap(), base);
}

#[test]
fn test_renormalize_is_idempotent() {
    let mut skewed = middle_3000();
    skewed.scale("housing", 1.7);
    skewed.scale("food", 0.3);

    let once = skewed.renormalize(3000.0);
    let twice = once.renormalize(3000.0);
    for (category, amount) in once.iter() {
        assert!((twice.amount(category) - amount).abs() < 1e-9);
    }

    let zero: CategoryAllocation = [("food", 0.0)].into_iter().collect();
    assert_eq!(zero.renormalize(3000.0), zero);
}

#[test]
fn test_full_chain_with_every_context() {
    let base = middle_3000();
    let behavior = BehaviorProfile::new(SpendingPersonality::Inconsistent);
    let history: BTreeMap<String, f64> = [
        ("housing".to_string(), 1200.0),
        ("food".to_string(), 500.0),
        ("entertainment".to_string(), 400.0),
    ]
    .into_iter()
    .collect();
    let peers: BTreeMap<String, PeerStat> =
        [("food".to_string(), PeerStat { peer_average: 250.0 })]
            .into_iter()
            .collect();
    let goals = [Goal::Investment, Goal::EmergencyFund];

    let ctx = AdjustmentContext::new(3000.0)
        .with_behavior(Some(&behavior))
        .with_history(Some(&history))
        .with_peers(Some(&peers))
        .with_goals(&goals)
        .with_location("Wichita, KS");

    let adjusted = Adjuster::new(&config()).apply(&base, &ctx);
    assert!(adjusted.allocation.sums_to(3000.0));
    assert!(adjusted.allocation.is_well_formed());
    assert!(adjusted.allocation.contains("investments"));
    assert_eq!(adjusted.applied().len(), 5);
}

// =============================================================================
// Velocity and redistribution
// =============================================================================

#[test]
fn test_velocity_examples() {
    let monitor = VelocityMonitor::new(&config().velocity);
    let budget: CategoryAllocation = [("entertainment", 300.0)].into_iter().collect();

    let spent: BTreeMap<String, f64> = [("entertainment".to_string(), 150.0)].into_iter().collect();
    let records = monitor.compute_velocity(&budget, &spent, 15);
    let r = &records["entertainment"];
    assert_eq!(r.velocity, 1.0);
    assert!(!r.needs_adjustment);
    assert_eq!(r.confidence, 0.7);
    assert_eq!(r.urgency, Urgency::Low);

    let spent: BTreeMap<String, f64> = [("entertainment".to_string(), 270.0)].into_iter().collect();
    let records = monitor.compute_velocity(&budget, &spent, 5);
    let r = &records["entertainment"];
    assert!((r.velocity - 1.08).abs() < 1e-9);
    assert!(!r.needs_adjustment);
    assert_eq!(r.reason, VelocityReason::OnTrack);
}

#[test]
fn test_start_of_month_has_nothing_to_redistribute() {
    let cfg = config();
    let budget = middle_3000();
    let records = VelocityMonitor::new(&cfg.velocity).compute_velocity(&budget, &BTreeMap::new(), 30);

    assert!(records.values().all(|r| r.velocity == 0.0 && !r.needs_adjustment));

    let result = Redistributor::new(&cfg).redistribute(&records, &budget, 3000.0);
    assert!(result.adjustments.is_empty());
    assert!(result.implementation_steps.is_empty());
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_mid_month_redistribution() {
    let cfg = config();
    let budget = middle_3000();
    let spent: BTreeMap<String, f64> = [
        ("housing".to_string(), 450.0),
        ("food".to_string(), 400.0),
        ("transportation".to_string(), 150.0),
        ("entertainment".to_string(), 30.0),
        ("savings".to_string(), 300.0),
        ("other".to_string(), 225.0),
    ]
    .into_iter()
    .collect();

    let records = VelocityMonitor::new(&cfg.velocity).compute_velocity(&budget, &spent, 15);
    let result = Redistributor::new(&cfg).redistribute(&records, &budget, 3000.0);

    let flagged: Vec<&str> = result
        .adjustments
        .iter()
        .map(|a| a.category.as_str())
        .collect();
    assert_eq!(flagged, vec!["entertainment", "food"]);
    assert_eq!(result.implementation_steps.len(), 5);
    assert!((result.confidence - 0.7).abs() < 1e-9);

    let expected_impact: f64 = result.adjustments.iter().map(|a| a.impact()).sum();
    assert!((result.total_impact - expected_impact).abs() < 1e-9);

    // Entertainment projects 60 of 300: half of its 234 surplus moves to food
    assert_eq!(result.transfers.len(), 1);
    assert_eq!(result.transfers[0].from, "entertainment");
    assert_eq!(result.transfers[0].to, "food");
    assert!((result.transfers[0].amount - 117.0).abs() < 1e-9);
}

// =============================================================================
// Calendar
// =============================================================================

#[test]
fn test_daily_calendar() {
    let budget = middle_3000();
    let days = daily_budgets(&budget, 2024, 6).unwrap();
    assert_eq!(days.len(), 30);
    assert!((days[0].total - 100.0).abs() < 1e-9);

    let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    let spent: BTreeMap<String, f64> = [("food".to_string(), 350.0)].into_iter().collect();
    let remaining = remaining_daily_budget(&budget, &spent, today);
    assert!((remaining.categories.amount("food") - 10.0).abs() < 1e-9);
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_recommendation_from_snapshot_file() {
    let snapshot = DataSnapshot {
        profile: Some(mita_core::UserProfile {
            location: Some("Boston, MA".to_string()),
            goals: vec![Goal::HomePurchase],
            ..Default::default()
        }),
        behavior: Some(BehaviorProfile::new(SpendingPersonality::Conservative)),
        ..Default::default()
    };
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_string(&snapshot).unwrap()).unwrap();

    let source = SnapshotSource::from_file(file.path()).unwrap();
    let engine = RecommendationEngine::new(config()).with_source(DataClient::Snapshot(source));
    let rec = engine
        .recommend(&RecommendationRequest::new(6000.0))
        .await
        .unwrap();

    assert_eq!(rec.income_tier, IncomeTier::Middle);
    assert!((rec.total_allocated - 6000.0).abs() < 1e-6);
    assert!((rec.confidence - 0.7).abs() < 1e-9);
    assert!(rec.behavioral_score > 0.5);
    assert!(rec.savings_rate > 0.20);
    assert_eq!(
        (rec.next_review_date - rec.generated_at.date_naive()).num_days(),
        30
    );
}

#[tokio::test]
async fn test_recommendation_survives_failing_collaborator() {
    let engine = RecommendationEngine::new(config())
        .with_source(DataClient::Mock(mita_core::MockDataSource::unavailable()));
    let rec = engine
        .recommend(&RecommendationRequest::new(2500.0))
        .await
        .unwrap();

    assert_eq!(rec.income_tier, IncomeTier::Low);
    assert!(rec.allocation.sums_to(2500.0));
    assert_eq!(rec.confidence, 0.5);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_override_changes_thresholds() {
    let cfg = parse_config(
        r#"
[velocity]
over_threshold = 1.05
"#,
    )
    .unwrap();
    let monitor = VelocityMonitor::new(&cfg.velocity);
    let r = monitor.record(300.0, 270.0, 25);
    assert!(r.needs_adjustment);
    assert_eq!(r.reason, VelocityReason::TrendingOverBudget);
}
