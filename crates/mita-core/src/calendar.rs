//! Spreading a monthly allocation across calendar days

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::allocation::CategoryAllocation;
use crate::error::{Error, Result};

/// Budget for a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBudget {
    pub date: NaiveDate,
    pub categories: CategoryAllocation,
    pub total: f64,
}

/// Number of days in a month (28-31). Invalid months return 30.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}

/// Days left in the month of `today`, counting today
pub fn days_left_including(today: NaiveDate) -> u32 {
    days_in_month(today.year(), today.month()) - today.day() + 1
}

/// Days left in the month of `today` once today has been spent
pub fn days_remaining_after(today: NaiveDate) -> u32 {
    days_in_month(today.year(), today.month()) - today.day()
}

/// One budget per calendar day, each category's amount split evenly
pub fn daily_budgets(
    allocation: &CategoryAllocation,
    year: i32,
    month: u32,
) -> Result<Vec<DailyBudget>> {
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(Error::InvalidInput(format!(
            "{}-{:02} is not a valid month",
            year, month
        )));
    }

    let days = days_in_month(year, month);
    let mut per_day = allocation.clone();
    per_day.scale_all(1.0 / days as f64);
    let total = per_day.total();

    Ok((1..=days)
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .map(|date| DailyBudget {
            date,
            categories: per_day.clone(),
            total,
        })
        .collect())
}

/// Daily amount per category that spreads what is left over the rest of the month
///
/// Overspent categories get zero.
pub fn remaining_daily_budget(
    allocation: &CategoryAllocation,
    spent: &BTreeMap<String, f64>,
    today: NaiveDate,
) -> DailyBudget {
    let days_left = days_left_including(today) as f64;

    let categories: CategoryAllocation = allocation
        .iter()
        .map(|(category, budget)| {
            let spent = spent.get(category).copied().unwrap_or(0.0);
            (category, (budget - spent).max(0.0) / days_left)
        })
        .collect();
    let total = categories.total();

    DailyBudget {
        date: today,
        categories,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation() -> CategoryAllocation {
        [("food", 310.0), ("housing", 930.0)].into_iter().collect()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 1), 31);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 13), 30);
    }

    #[test]
    fn test_days_left() {
        let mid = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(days_left_including(mid), 16);
        assert_eq!(days_remaining_after(mid), 15);

        let last = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(days_left_including(last), 1);
        assert_eq!(days_remaining_after(last), 0);
    }

    #[test]
    fn test_daily_budgets_cover_the_month() {
        let days = daily_budgets(&allocation(), 2024, 1).unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[30].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!((days[0].categories.amount("food") - 10.0).abs() < 1e-9);
        assert!((days[0].total - 40.0).abs() < 1e-9);

        let month_total: f64 = days.iter().map(|d| d.total).sum();
        assert!((month_total - allocation().total()).abs() < 1e-6);
    }

    #[test]
    fn test_daily_budgets_invalid_month() {
        let err = daily_budgets(&allocation(), 2024, 0).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_remaining_daily_budget() {
        let spent: BTreeMap<String, f64> = [("food".to_string(), 400.0), ("housing".to_string(), 330.0)]
            .into_iter()
            .collect();
        // Jan 22: 10 days left including today
        let today = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap();

        let daily = remaining_daily_budget(&allocation(), &spent, today);
        assert_eq!(daily.categories.amount("food"), 0.0);
        assert!((daily.categories.amount("housing") - 60.0).abs() < 1e-9);
        assert!((daily.total - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_last_day_of_month() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(days_left_including(today), 1);
    }
}
