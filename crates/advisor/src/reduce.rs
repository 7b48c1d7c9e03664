//! Local aggregates computed before any prompt is rendered.
//!
//! Every reducer is a pure function of the user's rows, the scenario payload
//! and today's date. The resulting structs are embedded in the prompt and
//! returned to the caller as `metrics`.

use chrono::{Months, NaiveDate};
use finquest_api::{
    BudgetAdvisorRequest, DebtAdvisorRequest, IncomeForecastRequest, NetWorthAdvisorRequest,
    RetirementAdvisorRequest, TaxAdvisorRequest, TaxRegime,
};
use finquest_core::portfolio::{self, AssetAllocation, DebtSummary, NetWorth};
use finquest_core::stats::{self, BillLoad, CategorySpend, GoalSummary, MonthTotal};
use finquest_core::{Asset, Bill, Expense, Goal, Liability, Profile, month_start};
use serde::Serialize;

/// Months of history used for spend averages.
pub const LOOKBACK_MONTHS: u32 = 3;
/// Months of spend history shown to the income forecaster.
pub const FORECAST_HISTORY_MONTHS: u32 = 6;
/// Default expected annual portfolio return, percent.
pub const DEFAULT_RETURN_PCT: f64 = 12.0;
pub const DEFAULT_INFLATION_PCT: f64 = 6.0;
pub const DEFAULT_GROWTH_PCT: f64 = 8.0;
pub const DEFAULT_PROJECTION_YEARS: u32 = 5;
const TOP_CATEGORIES: usize = 5;
const UPCOMING_BILL_DAYS: u32 = 30;

/// Category keywords that usually map to tax-deductible spend.
const DEDUCTION_KEYWORDS: &[&str] = &[
    "insurance",
    "education",
    "tuition",
    "health",
    "medical",
    "investment",
    "donation",
    "charity",
];

/// Everything the advisors read for one user.
#[derive(Debug, Clone, Default)]
pub struct FinancialSnapshot {
    pub profile: Option<Profile>,
    pub expenses: Vec<Expense>,
    pub goals: Vec<Goal>,
    pub bills: Vec<Bill>,
    pub assets: Vec<Asset>,
    pub liabilities: Vec<Liability>,
}

impl FinancialSnapshot {
    pub fn annual_salary(&self) -> f64 {
        self.profile.as_ref().map_or(0.0, |p| p.annual_salary)
    }

    pub fn monthly_income(&self) -> f64 {
        self.profile.as_ref().map_or(0.0, Profile::monthly_income)
    }

    fn expenses_since(&self, from: NaiveDate, today: NaiveDate) -> Vec<&Expense> {
        stats::filter_by_range(&self.expenses, Some(from), Some(today))
    }
}

/// First day of the window covering `months` calendar months ending this month.
fn window_start(today: NaiveDate, months: u32) -> NaiveDate {
    let current = month_start(today);
    current
        .checked_sub_months(Months::new(months.saturating_sub(1)))
        .unwrap_or(current)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalBrief {
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub progress_pct: f64,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LiabilityBrief {
    pub name: String,
    pub liability_type: String,
    pub outstanding_amount: f64,
    pub interest_rate: f64,
    pub emi_amount: f64,
}

fn active_goals(goals: &[Goal]) -> Vec<GoalBrief> {
    goals
        .iter()
        .filter(|g| !g.is_completed())
        .map(|g| GoalBrief {
            title: g.title.clone(),
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            progress_pct: g.progress_pct(),
            target_date: g.target_date,
        })
        .collect()
}

// ── budget ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetMetrics {
    pub monthly_income: f64,
    pub additional_monthly_income: f64,
    pub average_monthly_spend: f64,
    pub spend_by_category: Vec<CategorySpend>,
    pub savings_rate_pct: f64,
    pub active_goals: Vec<GoalBrief>,
    pub focus_categories: Vec<String>,
}

pub fn budget(s: &FinancialSnapshot, req: &BudgetAdvisorRequest, today: NaiveDate) -> BudgetMetrics {
    let additional = req.additional_monthly_income.unwrap_or(0.0);
    let monthly_income = s.monthly_income() + additional;
    let average = stats::average_monthly_spend(&s.expenses, LOOKBACK_MONTHS, today);
    let recent = s.expenses_since(window_start(today, LOOKBACK_MONTHS), today);
    BudgetMetrics {
        monthly_income,
        additional_monthly_income: additional,
        average_monthly_spend: average,
        spend_by_category: stats::spend_by_category(recent),
        savings_rate_pct: stats::savings_rate(monthly_income, average),
        active_goals: active_goals(&s.goals),
        focus_categories: req.focus_categories.clone(),
    }
}

// ── tax ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaxMetrics {
    pub annual_salary: f64,
    pub additional_income: f64,
    pub total_income: f64,
    pub preferred_regime: Option<TaxRegime>,
    /// Deduction-relevant spend over the last twelve months.
    pub deduction_spend: Vec<CategorySpend>,
    pub home_loan_interest: f64,
}

fn is_deduction_category(category: &str) -> bool {
    let lower = category.to_ascii_lowercase();
    DEDUCTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn tax(s: &FinancialSnapshot, req: &TaxAdvisorRequest, today: NaiveDate) -> TaxMetrics {
    let additional = req.additional_income.unwrap_or(0.0);
    let year = s
        .expenses_since(window_start(today, 12), today)
        .into_iter()
        .filter(|e| is_deduction_category(&e.category));
    TaxMetrics {
        annual_salary: s.annual_salary(),
        additional_income: additional,
        total_income: s.annual_salary() + additional,
        preferred_regime: req.regime,
        deduction_spend: stats::spend_by_category(year),
        home_loan_interest: portfolio::home_loan_interest(&s.liabilities),
    }
}

// ── retirement ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RetirementMetrics {
    pub current_age: u32,
    pub retirement_age: u32,
    pub years_to_retirement: u32,
    pub expected_return_pct: f64,
    pub inflation_pct: f64,
    pub net_worth: f64,
    pub monthly_income: f64,
    pub average_monthly_spend: f64,
    /// Payload override, else the observed average.
    pub monthly_expenses: f64,
    pub monthly_surplus: f64,
}

pub fn retirement(
    s: &FinancialSnapshot,
    req: &RetirementAdvisorRequest,
    today: NaiveDate,
) -> RetirementMetrics {
    let average = stats::average_monthly_spend(&s.expenses, LOOKBACK_MONTHS, today);
    let monthly_expenses = req.monthly_expenses.unwrap_or(average);
    let monthly_income = s.monthly_income();
    RetirementMetrics {
        current_age: req.current_age,
        retirement_age: req.retirement_age,
        years_to_retirement: req.retirement_age.saturating_sub(req.current_age),
        expected_return_pct: req.expected_return_pct.unwrap_or(DEFAULT_RETURN_PCT),
        inflation_pct: req.inflation_pct.unwrap_or(DEFAULT_INFLATION_PCT),
        net_worth: portfolio::net_worth(&s.assets, &s.liabilities).net_worth,
        monthly_income,
        average_monthly_spend: average,
        monthly_expenses,
        monthly_surplus: monthly_income - monthly_expenses,
    }
}

// ── debt ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DebtMetrics {
    #[serde(flatten)]
    pub summary: DebtSummary,
    pub extra_monthly_payment: f64,
    pub liabilities: Vec<LiabilityBrief>,
}

pub fn debt(s: &FinancialSnapshot, req: &DebtAdvisorRequest) -> DebtMetrics {
    DebtMetrics {
        summary: portfolio::debt_summary(&s.liabilities, s.monthly_income()),
        extra_monthly_payment: req.extra_monthly_payment.unwrap_or(0.0),
        liabilities: s
            .liabilities
            .iter()
            .filter(|l| l.outstanding_amount > 0.0)
            .map(|l| LiabilityBrief {
                name: l.name.clone(),
                liability_type: l.liability_type.clone(),
                outstanding_amount: l.outstanding_amount,
                interest_rate: l.interest_rate,
                emi_amount: l.emi_amount,
            })
            .collect(),
    }
}

// ── net worth ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NetWorthMetrics {
    #[serde(flatten)]
    pub totals: NetWorth,
    pub allocation: Vec<AssetAllocation>,
    /// Asset value under the per-asset depreciation model.
    pub depreciated_asset_value: f64,
    pub growth_rate_pct: f64,
    pub years: u32,
}

pub fn net_worth(s: &FinancialSnapshot, req: &NetWorthAdvisorRequest, today: NaiveDate) -> NetWorthMetrics {
    NetWorthMetrics {
        totals: portfolio::net_worth(&s.assets, &s.liabilities),
        allocation: portfolio::allocation_by_type(&s.assets),
        depreciated_asset_value: portfolio::total_depreciated_value(&s.assets, today),
        growth_rate_pct: req.growth_rate_pct.unwrap_or(DEFAULT_GROWTH_PCT),
        years: req.years.unwrap_or(DEFAULT_PROJECTION_YEARS).clamp(1, 50),
    }
}

// ── income forecast ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IncomeForecastMetrics {
    pub months: u32,
    pub monthly_income: f64,
    pub additional_monthly_income: f64,
    pub expected_raise_pct: f64,
    pub recent_spend: Vec<MonthTotal>,
    pub average_monthly_spend: f64,
    pub bills: BillLoad,
    /// Unpaid bills due in the next thirty days.
    pub upcoming_bills_total: f64,
}

/// `months` must already be clamped by the caller.
pub fn income_forecast(
    s: &FinancialSnapshot,
    req: &IncomeForecastRequest,
    months: u32,
    today: NaiveDate,
) -> IncomeForecastMetrics {
    let additional = req.additional_monthly_income.unwrap_or(0.0);
    IncomeForecastMetrics {
        months,
        monthly_income: s.monthly_income() + additional,
        additional_monthly_income: additional,
        expected_raise_pct: req.expected_raise_pct.unwrap_or(0.0),
        recent_spend: stats::monthly_totals(&s.expenses, FORECAST_HISTORY_MONTHS, today),
        average_monthly_spend: stats::average_monthly_spend(
            &s.expenses,
            FORECAST_HISTORY_MONTHS,
            today,
        ),
        bills: stats::bill_load(&s.bills, today),
        upcoming_bills_total: s
            .bills
            .iter()
            .filter(|b| b.is_due_within(today, UPCOMING_BILL_DAYS))
            .map(|b| b.amount)
            .sum(),
    }
}

// ── assistant ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatContext {
    pub monthly_income: f64,
    pub month_spend: f64,
    pub top_categories: Vec<CategorySpend>,
    pub goals: GoalSummary,
    pub active_goals: Vec<GoalBrief>,
    pub net_worth: NetWorth,
    pub debts: DebtSummary,
    pub bills: BillLoad,
}

pub fn chat_context(s: &FinancialSnapshot, today: NaiveDate) -> ChatContext {
    let this_month = s.expenses_since(month_start(today), today);
    let mut top = stats::spend_by_category(this_month.iter().copied());
    top.truncate(TOP_CATEGORIES);
    ChatContext {
        monthly_income: s.monthly_income(),
        month_spend: stats::total_spend(this_month),
        top_categories: top,
        goals: stats::goal_summary(&s.goals),
        active_goals: active_goals(&s.goals),
        net_worth: portfolio::net_worth(&s.assets, &s.liabilities),
        debts: portfolio::debt_summary(&s.liabilities, s.monthly_income()),
        bills: stats::bill_load(&s.bills, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finquest_core::testing;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            profile: Some(testing::profile(120_000.0)),
            expenses: vec![
                testing::expense("Food", 600.0, day(2025, 6, 3)),
                testing::expense("Travel", 300.0, day(2025, 5, 20)),
                testing::expense("Health Insurance", 1_200.0, day(2025, 4, 2)),
                testing::expense("Food", 900.0, day(2024, 12, 1)),
            ],
            goals: vec![
                testing::goal("Emergency fund", 10_000.0, 4_000.0),
                testing::goal("Laptop", 2_000.0, 2_000.0),
            ],
            bills: vec![testing::bill("Rent", 1_500.0, day(2025, 6, 20))],
            assets: vec![testing::asset("Index fund", "investment", 50_000.0)],
            liabilities: vec![
                testing::liability("Home loan", "home_loan", 40_000.0, 9.0, 800.0),
                testing::liability("Card", "credit_card", 0.0, 36.0, 0.0),
            ],
        }
    }

    #[test]
    fn budget_averages_last_three_months() {
        let m = budget(
            &snapshot(),
            &BudgetAdvisorRequest {
                additional_monthly_income: Some(1_000.0),
                focus_categories: vec!["Food".into()],
            },
            day(2025, 6, 15),
        );
        assert_eq!(m.monthly_income, 11_000.0);
        assert_eq!(m.average_monthly_spend, 700.0);
        assert_eq!(m.spend_by_category[0].category, "Health Insurance");
        assert_eq!(m.spend_by_category.len(), 3);
        assert_eq!(m.active_goals.len(), 1);
        assert_eq!(m.active_goals[0].title, "Emergency fund");
    }

    #[test]
    fn tax_keeps_only_deduction_categories() {
        let m = tax(
            &snapshot(),
            &TaxAdvisorRequest {
                additional_income: Some(5_000.0),
                regime: Some(TaxRegime::New),
            },
            day(2025, 6, 15),
        );
        assert_eq!(m.total_income, 125_000.0);
        assert_eq!(m.deduction_spend.len(), 1);
        assert_eq!(m.deduction_spend[0].total, 1_200.0);
        assert_eq!(m.home_loan_interest, 3_600.0);
    }

    #[test]
    fn retirement_prefers_payload_expenses() {
        let req = RetirementAdvisorRequest {
            current_age: 30,
            retirement_age: 60,
            expected_return_pct: None,
            inflation_pct: None,
            monthly_expenses: Some(4_000.0),
        };
        let m = retirement(&snapshot(), &req, day(2025, 6, 15));
        assert_eq!(m.years_to_retirement, 30);
        assert_eq!(m.expected_return_pct, DEFAULT_RETURN_PCT);
        assert_eq!(m.monthly_surplus, 6_000.0);
        assert_eq!(m.net_worth, 10_000.0);
    }

    #[test]
    fn debt_lists_only_open_liabilities() {
        let m = debt(&snapshot(), &DebtAdvisorRequest::default());
        assert_eq!(m.liabilities.len(), 1);
        assert_eq!(m.summary.total_emi, 800.0);
        assert_eq!(m.summary.debt_to_income_pct, 8.0);
    }

    #[test]
    fn forecast_history_is_zero_filled() {
        let m = income_forecast(
            &snapshot(),
            &IncomeForecastRequest::default(),
            6,
            day(2025, 6, 15),
        );
        assert_eq!(m.recent_spend.len(), FORECAST_HISTORY_MONTHS as usize);
        assert_eq!(m.recent_spend[0].month, "2025-01");
        assert_eq!(m.recent_spend[0].total, 0.0);
        assert_eq!(m.upcoming_bills_total, 1_500.0);
    }

    #[test]
    fn chat_context_covers_current_month() {
        let c = chat_context(&snapshot(), day(2025, 6, 15));
        assert_eq!(c.month_spend, 600.0);
        assert_eq!(c.top_categories.len(), 1);
        assert_eq!(c.goals.completed, 1);
        assert_eq!(c.net_worth.total_liabilities, 40_000.0);
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let s = FinancialSnapshot::default();
        let m = budget(&s, &BudgetAdvisorRequest::default(), day(2025, 6, 15));
        assert_eq!(m.monthly_income, 0.0);
        assert_eq!(m.savings_rate_pct, 0.0);
        assert!(m.spend_by_category.is_empty());
    }
}
