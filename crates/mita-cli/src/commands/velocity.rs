//! Velocity and redistribution commands

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{money, parse_date, print_json, read_budget, read_spent};
use crate::cli::PeriodArgs;
use mita_core::{
    BudgetAdjustment, CategoryAllocation, RecommendationEngine, Urgency, VelocityRecord,
};

/// JSON output of `mita redistribute`
#[derive(Debug, Serialize)]
pub struct RedistributionOutput {
    pub velocity: BTreeMap<String, VelocityRecord>,
    pub plan: BudgetAdjustment,
}

/// Load period inputs and compute velocity records
pub fn run_velocity(
    engine: &RecommendationEngine,
    period: &PeriodArgs,
) -> Result<(CategoryAllocation, BTreeMap<String, VelocityRecord>)> {
    let budget = read_budget(&period.budget)?;
    let spent = read_spent(period.spent.as_deref())?;
    let as_of = period.as_of.as_deref().map(parse_date).transpose()?;

    let (monitor, remaining_days) = engine
        .velocity_period(as_of, period.remaining_days)
        .context("Cannot determine the velocity period")?;
    let records = monitor.compute_velocity(&budget, &spent, remaining_days);
    Ok((budget, records))
}

pub fn cmd_velocity(engine: &RecommendationEngine, period: &PeriodArgs, json: bool) -> Result<()> {
    let (_, records) = run_velocity(engine, period)?;
    if json {
        return print_json(&records);
    }

    println!();
    println!("🚦 Spending Velocity");
    print_velocity(&records);
    println!();
    Ok(())
}

/// Velocity records plus a redistribution plan
pub async fn run_redistribute(
    engine: &RecommendationEngine,
    income: f64,
    period: &PeriodArgs,
) -> Result<RedistributionOutput> {
    if !income.is_finite() || income <= 0.0 {
        anyhow::bail!("Income must be positive, got {}", income);
    }
    let (budget, records) = run_velocity(engine, period)?;
    let plan = engine.redistribute(&records, &budget, income).await;
    Ok(RedistributionOutput {
        velocity: records,
        plan,
    })
}

pub async fn cmd_redistribute(
    engine: &RecommendationEngine,
    income: f64,
    period: &PeriodArgs,
    json: bool,
) -> Result<()> {
    let output = run_redistribute(engine, income, period).await?;
    if json {
        return print_json(&output);
    }

    println!();
    println!("🚦 Spending Velocity");
    print_velocity(&output.velocity);

    let plan = &output.plan;
    println!();
    if plan.is_empty() {
        println!("✅ No redistribution needed. Every category is on track.");
        println!();
        return Ok(());
    }

    println!(
        "🔄 Redistribution Plan (confidence {:.0}%, total impact {})",
        plan.confidence * 100.0,
        money(plan.total_impact)
    );
    for adj in &plan.adjustments {
        println!(
            "   {:<16} {:>10} → {:>10}  {} [{}]",
            adj.category,
            money(adj.current_amount),
            money(adj.recommended_amount),
            adj.reason.description(),
            adj.urgency
        );
    }

    if !plan.transfers.is_empty() {
        println!();
        println!("   Transfers:");
        for t in &plan.transfers {
            println!("     {} → {}: {}", t.from, t.to, money(t.amount));
        }
    }

    if !plan.optimizations.is_empty() {
        println!();
        println!("   Optimizations:");
        for opt in &plan.optimizations {
            println!(
                "     • {} ({}/month): {}",
                opt.title,
                money(opt.monthly_amount),
                opt.description
            );
        }
    }

    println!();
    println!("   Next steps:");
    for (i, step) in plan.implementation_steps.iter().enumerate() {
        println!("     {}. {}", i + 1, step);
    }
    println!();
    Ok(())
}

fn print_velocity(records: &BTreeMap<String, VelocityRecord>) {
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<16} {:>10} {:>10} {:>12} {:>8}",
        "category", "budget", "spent", "projected", "velocity"
    );
    for (category, r) in records {
        let marker = match (r.needs_adjustment, r.urgency) {
            (false, _) => "  ",
            (true, Urgency::High) => "🔴",
            (true, _) => "🟡",
        };
        println!(
            "{} {:<16} {:>10} {:>10} {:>12} {:>8.2}",
            marker,
            category,
            money(r.budget),
            money(r.spent),
            money(r.projected_monthly),
            r.velocity
        );
    }
}
