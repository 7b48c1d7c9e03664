use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::records::{month_key, month_start, Bill, Expense, Goal};

/// Spend grouped under one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpend {
    pub category: String,
    pub total: f64,
    pub count: u64,
    pub share_pct: f64,
}

/// Spend total for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GoalSummary {
    pub active: u64,
    pub completed: u64,
    pub total_target: f64,
    pub total_saved: f64,
    pub overall_progress_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillLoad {
    pub unpaid_count: u64,
    pub unpaid_total: f64,
    pub overdue_count: u64,
    /// Recurring bills normalized to a monthly amount.
    pub monthly_recurring: f64,
}

pub fn total_spend<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> f64 {
    expenses.into_iter().map(|e| e.amount).sum()
}

/// Expenses dated within `[from, to]` (either bound optional).
pub fn filter_by_range(
    expenses: &[Expense],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|e| from.is_none_or(|f| e.date >= f) && to.is_none_or(|t| e.date <= t))
        .collect()
}

/// Group spend by category. Sorted by total descending, then name.
pub fn spend_by_category<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Vec<CategorySpend> {
    let mut map = HashMap::<&str, (f64, u64)>::new();
    for e in expenses {
        let entry = map.entry(e.category.as_str()).or_default();
        entry.0 += e.amount;
        entry.1 += 1;
    }
    let grand_total: f64 = map.values().map(|(total, _)| total).sum();
    let mut result: Vec<CategorySpend> = map
        .into_iter()
        .map(|(category, (total, count))| CategorySpend {
            category: category.to_string(),
            total,
            count,
            share_pct: percent_of(total, grand_total),
        })
        .collect();
    result.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// Totals for the `months` calendar months ending with the month of `today`,
/// oldest first. Months without spend are present with a zero total.
pub fn monthly_totals(expenses: &[Expense], months: u32, today: NaiveDate) -> Vec<MonthTotal> {
    let months = months.max(1);
    let current = month_start(today);
    let first = current
        .checked_sub_months(Months::new(months - 1))
        .unwrap_or(current);

    let mut sums = HashMap::<String, f64>::new();
    for e in expenses.iter().filter(|e| e.date >= first && e.date <= today) {
        *sums.entry(month_key(e.date)).or_default() += e.amount;
    }

    (0..months)
        .filter_map(|i| first.checked_add_months(Months::new(i)))
        .map(|m| {
            let key = month_key(m);
            let total = sums.get(&key).copied().unwrap_or(0.0);
            MonthTotal { month: key, total }
        })
        .collect()
}

/// Mean of [`monthly_totals`] over the window.
pub fn average_monthly_spend(expenses: &[Expense], months: u32, today: NaiveDate) -> f64 {
    let totals = monthly_totals(expenses, months, today);
    if totals.is_empty() {
        return 0.0;
    }
    totals.iter().map(|m| m.total).sum::<f64>() / totals.len() as f64
}

/// Consecutive days with at least one expense, ending today.
///
/// A run ending yesterday still counts when nothing is logged today yet.
/// Future dates are ignored; duplicate dates count once.
pub fn streak_days(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u64 {
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();
    let Some(yesterday) = today.pred_opt() else {
        return 0;
    };
    let mut cursor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

pub fn goals_completed(goals: &[Goal]) -> u64 {
    goals.iter().filter(|g| g.is_completed()).count() as u64
}

pub fn goal_summary(goals: &[Goal]) -> GoalSummary {
    let completed = goals_completed(goals);
    let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let total_saved: f64 = goals
        .iter()
        .map(|g| g.current_amount.min(g.target_amount.max(0.0)))
        .sum();
    GoalSummary {
        active: goals.len() as u64 - completed,
        completed,
        total_target,
        total_saved,
        overall_progress_pct: percent_of(total_saved, total_target),
    }
}

pub fn bill_load(bills: &[Bill], today: NaiveDate) -> BillLoad {
    let mut load = BillLoad::default();
    for bill in bills {
        if !bill.is_paid {
            load.unpaid_count += 1;
            load.unpaid_total += bill.amount;
            if bill.is_overdue(today) {
                load.overdue_count += 1;
            }
            // Paid recurring bills already rolled over into an unpaid successor.
            if bill.frequency.is_recurring() {
                load.monthly_recurring += bill.amount * bill.frequency.per_year() / 12.0;
            }
        }
    }
    load
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Share of income left after spend, in percent. Negative when overspending.
pub fn savings_rate(monthly_income: f64, monthly_spend: f64) -> f64 {
    percent_of(monthly_income - monthly_spend, monthly_income)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BillFrequency;
    use crate::testing;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn streak_counts_consecutive_days_ending_today() {
        let today = day(2025, 6, 10);
        let dates = [day(2025, 6, 10), day(2025, 6, 9), day(2025, 6, 8)];
        assert_eq!(streak_days(dates, today), 3);
    }

    #[test]
    fn streak_survives_until_a_full_day_is_missed() {
        let today = day(2025, 6, 10);
        let dates = [day(2025, 6, 9), day(2025, 6, 8)];
        assert_eq!(streak_days(dates, today), 2);

        let stale = [day(2025, 6, 8), day(2025, 6, 7)];
        assert_eq!(streak_days(stale, today), 0);
    }

    #[test]
    fn streak_gap_resets_run() {
        let today = day(2025, 6, 10);
        let dates = [
            day(2025, 6, 10),
            day(2025, 6, 9),
            day(2025, 6, 7),
            day(2025, 6, 6),
        ];
        assert_eq!(streak_days(dates, today), 2);
    }

    #[test]
    fn streak_ignores_duplicates_and_future_dates() {
        let today = day(2025, 6, 10);
        let dates = [
            day(2025, 6, 10),
            day(2025, 6, 10),
            day(2025, 6, 11),
            day(2025, 6, 9),
        ];
        assert_eq!(streak_days(dates, today), 2);
        assert_eq!(streak_days([], today), 0);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let today = day(2025, 3, 1);
        let dates = [day(2025, 3, 1), day(2025, 2, 28), day(2025, 2, 27)];
        assert_eq!(streak_days(dates, today), 3);
    }

    #[test]
    fn category_grouping_sorted_with_shares() {
        let today = day(2025, 6, 10);
        let expenses = vec![
            testing::expense("Food", 30.0, today),
            testing::expense("Transport", 50.0, today),
            testing::expense("Food", 20.0, today),
        ];
        let grouped = spend_by_category(&expenses);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].category, "Food");
        assert_eq!(grouped[0].total, 50.0);
        assert_eq!(grouped[0].count, 2);
        assert_eq!(grouped[0].share_pct, 50.0);
        assert_eq!(grouped[1].category, "Transport");
    }

    #[test]
    fn monthly_totals_zero_fill_oldest_first() {
        let today = day(2025, 3, 15);
        let expenses = vec![
            testing::expense("Food", 10.0, day(2025, 1, 5)),
            testing::expense("Food", 5.0, day(2025, 3, 1)),
            testing::expense("Food", 7.0, day(2024, 12, 31)),
            testing::expense("Food", 99.0, day(2025, 3, 20)),
        ];
        let totals = monthly_totals(&expenses, 3, today);
        let months: Vec<_> = totals.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02", "2025-03"]);
        assert_eq!(totals[0].total, 10.0);
        assert_eq!(totals[1].total, 0.0);
        assert_eq!(totals[2].total, 5.0);
        assert_eq!(average_monthly_spend(&expenses, 3, today), 5.0);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let expenses = vec![
            testing::expense("Food", 1.0, day(2025, 1, 1)),
            testing::expense("Food", 2.0, day(2025, 1, 31)),
            testing::expense("Food", 3.0, day(2025, 2, 1)),
        ];
        let jan = filter_by_range(&expenses, Some(day(2025, 1, 1)), Some(day(2025, 1, 31)));
        assert_eq!(total_spend(jan), 3.0);
        assert_eq!(filter_by_range(&expenses, None, None).len(), 3);
    }

    #[test]
    fn goal_summary_caps_overfunded_goals() {
        let goals = vec![
            testing::goal("Car", 1000.0, 1500.0),
            testing::goal("Trip", 1000.0, 500.0),
        ];
        let summary = goal_summary(&goals);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.total_saved, 1500.0);
        assert_eq!(summary.overall_progress_pct, 75.0);
    }

    #[test]
    fn bill_load_normalizes_recurring_bills() {
        let today = day(2025, 6, 10);
        let mut weekly = testing::bill("Cleaner", 52.0, day(2025, 6, 1));
        weekly.frequency = BillFrequency::Weekly;
        let mut yearly = testing::bill("Insurance", 1200.0, day(2025, 7, 1));
        yearly.frequency = BillFrequency::Yearly;
        yearly.is_paid = true;

        let load = bill_load(&[weekly, yearly], today);
        assert_eq!(load.unpaid_count, 1);
        assert_eq!(load.overdue_count, 1);
        assert_eq!(load.unpaid_total, 52.0);
        assert!((load.monthly_recurring - 52.0 * 52.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn savings_rate_handles_zero_income() {
        assert_eq!(savings_rate(0.0, 100.0), 0.0);
        assert_eq!(savings_rate(1000.0, 250.0), 75.0);
        assert_eq!(savings_rate(1000.0, 1500.0), -50.0);
    }
}
