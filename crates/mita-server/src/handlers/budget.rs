//! Budget handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, AppState};
use mita_core::{
    calendar::{daily_budgets, remaining_daily_budget},
    BudgetAdjustment, BudgetRecommendation, CategoryAllocation, DailyBudget, IncomeTier,
    RecommendationRequest, VelocityRecord,
};

/// Request body for a base allocation
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub monthly_income: f64,
    /// Overrides the income classification
    #[serde(default)]
    pub tier: Option<IncomeTier>,
}

#[derive(Debug, Serialize)]
pub struct AllocateResponse {
    pub monthly_income: f64,
    pub tier: IncomeTier,
    pub allocation: CategoryAllocation,
    pub total: f64,
}

/// Request body for velocity computation
#[derive(Debug, Deserialize)]
pub struct VelocityRequest {
    pub budget: CategoryAllocation,
    /// Spent so far per category
    #[serde(default)]
    pub spent: BTreeMap<String, f64>,
    /// Days left in the period; derived from `as_of` when omitted
    #[serde(default)]
    pub remaining_days: Option<u32>,
    /// Use the calendar month containing this date as the period
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Request body for redistribution
#[derive(Debug, Deserialize)]
pub struct RedistributeRequest {
    pub monthly_income: f64,
    #[serde(flatten)]
    pub period: VelocityRequest,
}

#[derive(Debug, Serialize)]
pub struct RedistributeResponse {
    pub velocity: BTreeMap<String, VelocityRecord>,
    pub plan: BudgetAdjustment,
}

/// Request body for the daily calendar
#[derive(Debug, Deserialize)]
pub struct DailyRequest {
    pub budget: CategoryAllocation,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    /// Month to spread over when year/month are omitted, and "today" for the remaining budget
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// When present with `as_of`, also compute the remaining daily budget
    #[serde(default)]
    pub spent: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    pub days: Vec<DailyBudget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<DailyBudget>,
}

fn validate_income(monthly_income: f64) -> Result<(), AppError> {
    if !monthly_income.is_finite() || monthly_income <= 0.0 {
        return Err(AppError::bad_request("monthly_income must be a positive number"));
    }
    Ok(())
}

fn validate_budget(budget: &CategoryAllocation, max_categories: usize) -> Result<(), AppError> {
    if budget.is_empty() {
        return Err(AppError::bad_request("budget must contain at least one category"));
    }
    if budget.len() > max_categories {
        return Err(AppError::bad_request(&format!(
            "budget may contain at most {} categories",
            max_categories
        )));
    }
    if !budget.is_well_formed() {
        return Err(AppError::bad_request(
            "budget amounts must be finite and non-negative",
        ));
    }
    Ok(())
}

fn validate_spent(spent: &BTreeMap<String, f64>, max_categories: usize) -> Result<(), AppError> {
    if spent.len() > max_categories {
        return Err(AppError::bad_request(&format!(
            "spent may contain at most {} categories",
            max_categories
        )));
    }
    if spent.values().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(AppError::bad_request(
            "spent amounts must be finite and non-negative",
        ));
    }
    Ok(())
}

/// Validate a velocity request and compute its records
fn compute_records(
    state: &AppState,
    request: &VelocityRequest,
) -> Result<BTreeMap<String, VelocityRecord>, AppError> {
    let max_categories = state.config.max_categories;
    validate_budget(&request.budget, max_categories)?;
    validate_spent(&request.spent, max_categories)?;
    let (monitor, remaining_days) = state
        .engine
        .velocity_period(request.as_of, request.remaining_days)
        .map_err(AppError::engine)?;
    Ok(monitor.compute_velocity(&request.budget, &request.spent, remaining_days))
}

/// POST /api/budget/allocate - Base allocation for an income
pub async fn allocate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AllocateRequest>,
) -> Result<Json<AllocateResponse>, AppError> {
    let engine = &state.engine;
    let tier = request
        .tier
        .unwrap_or_else(|| engine.allocator().classify_income(request.monthly_income));
    let allocation = engine
        .allocate(request.monthly_income, Some(tier))
        .map_err(AppError::engine)?;

    Ok(Json(AllocateResponse {
        monthly_income: request.monthly_income,
        tier,
        total: allocation.total(),
        allocation,
    }))
}

/// POST /api/budget/recommend - Personalized recommendation
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<BudgetRecommendation>, AppError> {
    let recommendation = state
        .engine
        .recommend(&request)
        .await
        .map_err(AppError::engine)?;

    debug!(
        tier = %recommendation.income_tier,
        confidence = recommendation.confidence,
        "Served recommendation"
    );
    Ok(Json(recommendation))
}

/// POST /api/budget/velocity - Spending velocity per category
pub async fn velocity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VelocityRequest>,
) -> Result<Json<BTreeMap<String, VelocityRecord>>, AppError> {
    let records = compute_records(&state, &request)?;
    Ok(Json(records))
}

/// POST /api/budget/redistribute - Velocity plus redistribution plan
pub async fn redistribute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RedistributeRequest>,
) -> Result<Json<RedistributeResponse>, AppError> {
    validate_income(request.monthly_income)?;
    let records = compute_records(&state, &request.period)?;

    let plan = state
        .engine
        .redistribute(&records, &request.period.budget, request.monthly_income)
        .await;

    debug!(
        adjustments = plan.adjustments.len(),
        transfers = plan.transfers.len(),
        "Served redistribution"
    );
    Ok(Json(RedistributeResponse {
        velocity: records,
        plan,
    }))
}

/// POST /api/budget/daily - Daily budget calendar
pub async fn daily(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DailyRequest>,
) -> Result<Json<DailyResponse>, AppError> {
    let max_categories = state.config.max_categories;
    validate_budget(&request.budget, max_categories)?;

    let (year, month) = match (request.year, request.month, request.as_of) {
        (Some(year), Some(month), _) => (year, month),
        (_, _, Some(date)) => (date.year(), date.month()),
        _ => return Err(AppError::bad_request("year and month, or as_of, are required")),
    };
    let days = daily_budgets(&request.budget, year, month).map_err(AppError::engine)?;

    let remaining = match (&request.spent, request.as_of) {
        (Some(spent), Some(today)) => {
            validate_spent(spent, max_categories)?;
            Some(remaining_daily_budget(&request.budget, spent, today))
        }
        _ => None,
    };

    Ok(Json(DailyResponse { days, remaining }))
}
