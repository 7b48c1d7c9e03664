//! Flat, user-owned finance records.
//!
//! Every record carries the owning `user_id`; the store filters every read and
//! write by it. Amounts are non-negative `f64`, dates are calendar days.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Goal {
    /// Progress towards the target in percent (uncapped). Zero for a non-positive target.
    pub fn progress_pct(&self) -> f64 {
        crate::milestones::progress_pct(self.current_amount, self.target_amount)
    }

    pub fn is_completed(&self) -> bool {
        self.target_amount > 0.0 && self.current_amount >= self.target_amount
    }
}

/// How often a bill recurs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillFrequency {
    Once,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "once" => Some(Self::Once),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::Once)
    }

    /// Next due date after `due`. Month arithmetic clamps to the end of the
    /// target month (Jan 31 + 1 month = Feb 28/29). `None` for one-off bills.
    pub fn next_due(&self, due: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Once => None,
            Self::Weekly => due.checked_add_days(chrono::Days::new(7)),
            Self::Monthly => due.checked_add_months(Months::new(1)),
            Self::Quarterly => due.checked_add_months(Months::new(3)),
            Self::Yearly => due.checked_add_months(Months::new(12)),
        }
    }

    /// Rough number of occurrences per year, used to normalize bill load per month.
    pub fn per_year(&self) -> f64 {
        match self {
            Self::Once => 0.0,
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
            Self::Quarterly => 4.0,
            Self::Yearly => 1.0,
        }
    }
}

impl std::fmt::Display for BillFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub amount: f64,
    pub frequency: BillFrequency,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Bill {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid && self.due_date < today
    }

    /// Unpaid and due between `today` and `today + days` (inclusive).
    pub fn is_due_within(&self, today: NaiveDate, days: u32) -> bool {
        if self.is_paid || self.due_date < today {
            return false;
        }
        (self.due_date - today).num_days() <= i64::from(days)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub asset_type: String,
    pub purchase_value: f64,
    pub current_value: f64,
    /// Percent per year.
    pub depreciation_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Asset {
    /// `purchase_value * (1 - rate/100)^years_held`, floored at zero.
    pub fn depreciated_value(&self, today: NaiveDate) -> f64 {
        let years = self
            .purchase_date
            .map(|d| years_between(d, today))
            .unwrap_or(0.0);
        depreciated_value(self.purchase_value, self.depreciation_rate, years)
    }
}

pub fn depreciated_value(purchase_value: f64, rate_pct: f64, years: f64) -> f64 {
    if years <= 0.0 || rate_pct <= 0.0 {
        return purchase_value.max(0.0);
    }
    let factor = (1.0 - rate_pct / 100.0).max(0.0);
    (purchase_value * factor.powf(years)).max(0.0)
}

fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    if to <= from {
        return 0.0;
    }
    (to - from).num_days() as f64 / 365.25
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Liability {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub liability_type: String,
    pub principal_amount: f64,
    pub outstanding_amount: f64,
    /// Percent per year.
    pub interest_rate: f64,
    pub emi_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub icon: String,
    pub created_at: String,
}

/// A built-in expense category, available to every user.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BuiltinCategory {
    pub name: &'static str,
    pub icon: &'static str,
}

pub const BUILTIN_CATEGORIES: &[BuiltinCategory] = &[
    BuiltinCategory { name: "Food", icon: "🍔" },
    BuiltinCategory { name: "Transport", icon: "🚗" },
    BuiltinCategory { name: "Shopping", icon: "🛍️" },
    BuiltinCategory { name: "Entertainment", icon: "🎬" },
    BuiltinCategory { name: "Bills", icon: "🧾" },
    BuiltinCategory { name: "Health", icon: "💊" },
    BuiltinCategory { name: "Education", icon: "📚" },
    BuiltinCategory { name: "Travel", icon: "✈️" },
    BuiltinCategory { name: "Groceries", icon: "🛒" },
    BuiltinCategory { name: "Other", icon: "📦" },
];

pub fn is_builtin_category(name: &str) -> bool {
    BUILTIN_CATEGORIES
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub annual_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    pub fn monthly_income(&self) -> f64 {
        self.annual_salary / 12.0
    }
}

/// A persisted award. `achievement_type` is an id from [`crate::achievements::CATALOGUE`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    pub id: String,
    pub user_id: String,
    pub achievement_type: String,
    pub points: i64,
    pub earned_at: String,
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `YYYY-MM` key for grouping by month.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_rollover_clamps_to_month_end() {
        assert_eq!(
            BillFrequency::Monthly.next_due(day(2024, 1, 31)),
            Some(day(2024, 2, 29))
        );
        assert_eq!(
            BillFrequency::Quarterly.next_due(day(2025, 11, 30)),
            Some(day(2026, 2, 28))
        );
    }

    #[test]
    fn weekly_and_yearly_rollover() {
        assert_eq!(
            BillFrequency::Weekly.next_due(day(2025, 12, 29)),
            Some(day(2026, 1, 5))
        );
        assert_eq!(
            BillFrequency::Yearly.next_due(day(2024, 2, 29)),
            Some(day(2025, 2, 28))
        );
        assert_eq!(BillFrequency::Once.next_due(day(2025, 1, 1)), None);
    }

    #[test]
    fn frequency_parse_matches_as_str() {
        for f in [
            BillFrequency::Once,
            BillFrequency::Weekly,
            BillFrequency::Monthly,
            BillFrequency::Quarterly,
            BillFrequency::Yearly,
        ] {
            assert_eq!(BillFrequency::parse(f.as_str()), Some(f));
        }
        assert_eq!(BillFrequency::parse("daily"), None);
    }

    #[test]
    fn depreciation_compounds_yearly() {
        let v = depreciated_value(100_000.0, 10.0, 2.0);
        assert!((v - 81_000.0).abs() < 1e-6);
        assert_eq!(depreciated_value(100.0, 150.0, 1.0), 0.0);
        assert_eq!(depreciated_value(100.0, 10.0, 0.0), 100.0);
    }

    #[test]
    fn bill_due_window() {
        let today = day(2025, 3, 10);
        let mut bill = crate::testing::bill("Rent", 1200.0, day(2025, 3, 15));
        assert!(bill.is_due_within(today, 7));
        assert!(!bill.is_due_within(today, 3));
        bill.due_date = day(2025, 3, 1);
        assert!(bill.is_overdue(today));
        assert!(!bill.is_due_within(today, 7));
        bill.is_paid = true;
        assert!(!bill.is_overdue(today));
    }

    #[test]
    fn builtin_category_lookup_ignores_case() {
        assert!(is_builtin_category("food"));
        assert!(!is_builtin_category("Crypto"));
    }
}
