//! Budget commands (allocate, recommend, daily)

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use serde::Serialize;

use super::{money, parse_date, parse_month, parse_tier, print_json, read_budget, read_spent};
use mita_core::{
    calendar::{daily_budgets, remaining_daily_budget},
    AllocationSource, BudgetRecommendation, CategoryAllocation, DailyBudget, IncomeTier,
    RecommendationEngine, RecommendationRequest, StageStatus,
};

/// JSON output of `mita allocate`
#[derive(Debug, Serialize)]
pub struct AllocationOutput {
    pub monthly_income: f64,
    pub tier: IncomeTier,
    pub allocation: CategoryAllocation,
}

/// JSON output of `mita daily`
#[derive(Debug, Serialize)]
pub struct DailyOutput {
    pub days: Vec<DailyBudget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<DailyBudget>,
}

/// Base allocation for an income
pub fn run_allocate(
    engine: &RecommendationEngine,
    income: f64,
    tier: Option<&str>,
) -> Result<AllocationOutput> {
    let tier = parse_tier(tier)?.unwrap_or_else(|| engine.allocator().classify_income(income));
    let allocation = engine
        .allocate(income, Some(tier))
        .context("Allocation failed")?;
    Ok(AllocationOutput {
        monthly_income: income,
        tier,
        allocation,
    })
}

pub fn cmd_allocate(
    engine: &RecommendationEngine,
    income: f64,
    tier: Option<&str>,
    json: bool,
) -> Result<()> {
    let output = run_allocate(engine, income, tier)?;
    if json {
        return print_json(&output);
    }

    println!();
    println!("💰 Budget for {} / month", money(output.monthly_income));
    println!("   Income tier: {}", output.tier);
    println!("   ─────────────────────────────────────────");
    print_allocation(&output.allocation, output.monthly_income);
    println!();
    Ok(())
}

pub async fn cmd_recommend(
    engine: &RecommendationEngine,
    request: &RecommendationRequest,
    json: bool,
) -> Result<()> {
    let rec = engine
        .recommend(request)
        .await
        .context("Recommendation failed")?;
    if json {
        return print_json(&rec);
    }
    print_recommendation(&rec);
    Ok(())
}

fn print_recommendation(rec: &BudgetRecommendation) {
    println!();
    println!("🎯 Recommended Budget");
    println!(
        "   Tier: {}   Style: {}   Confidence: {:.0}%",
        rec.income_tier,
        rec.style,
        rec.confidence * 100.0
    );
    let source = match rec.allocation_source {
        AllocationSource::Backend => "backend suggestion",
        AllocationSource::WeightTable => "tier weights",
    };
    if rec.data_sources.is_empty() {
        println!("   Base: {} (no collaborator data)", source);
    } else {
        println!("   Base: {} + {}", source, rec.data_sources.join(", "));
    }
    println!("   ─────────────────────────────────────────");
    print_allocation(&rec.allocation, rec.total_allocated);
    println!("   Savings rate: {:.1}%", rec.savings_rate * 100.0);

    let applied: Vec<&str> = rec
        .stages
        .iter()
        .filter(|s| s.status == StageStatus::Applied)
        .map(|s| s.stage.as_str())
        .collect();
    if !applied.is_empty() {
        println!("   Adjusted by: {}", applied.join(", "));
    }
    for report in &rec.stages {
        if let StageStatus::Failed(ref reason) = report.status {
            println!("   ⚠️  Stage {} skipped: {}", report.stage, reason);
        }
    }

    print_section("💡 Insights", &rec.insights);
    print_section("🔧 Optimization tips", &rec.optimization_tips);
    print_section("⚠️  Risk factors", &rec.risk_factors);

    println!();
    println!("   Next review: {}", rec.next_review_date);
    println!();
}

fn print_section(title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!();
    println!("   {}", title);
    for line in lines {
        println!("     • {}", line);
    }
}

fn print_allocation(allocation: &CategoryAllocation, income: f64) {
    for (category, amount) in allocation.iter() {
        let share = if income > 0.0 { amount / income * 100.0 } else { 0.0 };
        println!("   {:<16} {:>12}  {:>5.1}%", category, money(amount), share);
    }
    println!("   {:<16} {:>12}", "total", money(allocation.total()));
}

/// Daily calendar, plus the remaining daily budget when spending is known
pub fn run_daily(
    budget: &Path,
    month: Option<&str>,
    as_of: Option<&str>,
    spent: Option<&Path>,
) -> Result<DailyOutput> {
    let allocation = read_budget(budget)?;
    let today = as_of.map(parse_date).transpose()?;

    let (year, month) = match (month, today) {
        (Some(m), _) => parse_month(m)?,
        (None, Some(d)) => (d.year(), d.month()),
        (None, None) => {
            let now = Local::now().date_naive();
            (now.year(), now.month())
        }
    };
    let days = daily_budgets(&allocation, year, month)?;

    let remaining = match (spent, today) {
        (Some(path), Some(today)) => {
            let spent = read_spent(Some(path))?;
            Some(remaining_daily_budget(&allocation, &spent, today))
        }
        (Some(_), None) => anyhow::bail!("--spent requires --as-of"),
        _ => None,
    };

    Ok(DailyOutput { days, remaining })
}

pub fn cmd_daily(
    budget: &Path,
    month: Option<&str>,
    as_of: Option<&str>,
    spent: Option<&Path>,
    json: bool,
) -> Result<()> {
    let output = run_daily(budget, month, as_of, spent)?;
    if json {
        return print_json(&output);
    }

    let (Some(first), Some(last)) = (output.days.first(), output.days.last()) else {
        return Ok(());
    };
    println!();
    println!(
        "📅 Daily Budget ({} to {}, {} days)",
        first.date,
        last.date,
        output.days.len()
    );
    println!("   ─────────────────────────────────────────");
    for (category, amount) in first.categories.iter() {
        println!("   {:<16} {:>10} / day", category, money(amount));
    }
    println!("   {:<16} {:>10} / day", "total", money(first.total));

    if let Some(remaining) = output.remaining {
        println!();
        println!("   From {} to month end:", remaining.date);
        for (category, amount) in remaining.categories.iter() {
            println!("   {:<16} {:>10} / day", category, money(amount));
        }
        println!("   {:<16} {:>10} / day", "total", money(remaining.total));
    }
    println!();
    Ok(())
}
