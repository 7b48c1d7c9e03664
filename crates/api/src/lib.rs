//! Shared API types, auth, and SQL builders for FinQuest.
//!
//! This crate is the **single source of truth** for all API request/response
//! types. The server, the typed client and the advisor crate all depend on it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
#[cfg(feature = "backend")]
pub mod service;

// Re-export core record types for convenience
pub use finquest_core::achievements::{Metric, UserStats};
pub use finquest_core::milestones::{Milestone, MilestoneKind};
pub use finquest_core::portfolio::{AssetAllocation, DebtSummary, NetWorth};
pub use finquest_core::stats::{BillLoad, CategorySpend, GoalSummary, MonthTotal};
pub use finquest_core::{
    Achievement, Asset, Bill, BillFrequency, Category, Expense, Goal, Liability, Profile,
};

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Tables that publish change notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Expenses,
    Goals,
    Bills,
    Assets,
    Liabilities,
    Categories,
    Profiles,
    Achievements,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Self::Expenses,
        Self::Goals,
        Self::Bills,
        Self::Assets,
        Self::Liabilities,
        Self::Categories,
        Self::Profiles,
        Self::Achievements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expenses => "expenses",
            Self::Goals => "goals",
            Self::Bills => "bills",
            Self::Assets => "assets",
            Self::Liabilities => "liabilities",
            Self::Categories => "categories",
            Self::Profiles => "profiles",
            Self::Achievements => "achievements",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisor features backed by the LLM gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorKind {
    Budget,
    Tax,
    Retirement,
    Debt,
    NetWorth,
    IncomeForecast,
    Chat,
}

impl AdvisorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Tax => "tax",
            Self::Retirement => "retirement",
            Self::Debt => "debt",
            Self::NetWorth => "net_worth",
            Self::IncomeForecast => "income_forecast",
            Self::Chat => "chat",
        }
    }
}

impl std::fmt::Display for AdvisorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Health / Auth ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Runtime feature availability.
#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub advisor_enabled: bool,
    pub llm_provider: Option<String>,
}

/// Identity of the caller, taken from the verified token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub annual_salary: Option<f64>,
    pub display_name: Option<String>,
}

// ─── Expenses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateExpenseRequest {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Filters for `GET /api/expenses`. Date bounds are inclusive.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExpenseListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub expense: Expense,
    /// Achievements unlocked by this write.
    #[serde(default)]
    pub new_achievements: Vec<AwardedAchievement>,
}

// ─── Goals ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalResponse {
    pub goal: Goal,
    /// One-shot progress notification, if this update produced one.
    pub milestone: Option<Milestone>,
    #[serde(default)]
    pub new_achievements: Vec<AwardedAchievement>,
}

// ─── Bills ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBillRequest {
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub frequency: BillFrequency,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateBillRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub frequency: Option<BillFrequency>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub is_paid: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BillListQuery {
    /// Only unpaid bills when `true`.
    pub unpaid: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpcomingBillsQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpcomingBillsResponse {
    pub days: u32,
    pub due_soon: Vec<Bill>,
    pub overdue: Vec<Bill>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayBillResponse {
    pub bill: Bill,
    /// Next occurrence of a recurring bill.
    pub next_bill: Option<Bill>,
}

// ─── Assets / Liabilities ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub asset_type: String,
    pub purchase_value: f64,
    /// Defaults to `purchase_value`.
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub depreciation_rate: f64,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub purchase_value: Option<f64>,
    pub current_value: Option<f64>,
    pub depreciation_rate: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLiabilityRequest {
    pub name: String,
    pub liability_type: String,
    pub principal_amount: f64,
    /// Defaults to `principal_amount`.
    #[serde(default)]
    pub outstanding_amount: Option<f64>,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub emi_amount: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateLiabilityRequest {
    pub name: Option<String>,
    pub liability_type: Option<String>,
    pub principal_amount: Option<f64>,
    pub outstanding_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub emi_amount: Option<f64>,
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryInfo {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub builtin: Vec<CategoryInfo>,
    pub custom: Vec<Category>,
}

// ─── Achievements / Stats ────────────────────────────────────────────────────

/// An achievement awarded by an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardedAchievement {
    pub achievement_type: String,
    pub name: String,
    pub points: i64,
    pub earned_at: String,
}

/// Catalogue entry with the caller's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub id: String,
    pub name: String,
    pub description: String,
    pub metric: Metric,
    pub threshold: u64,
    pub current: u64,
    pub points: i64,
    pub progress_pct: f64,
    pub earned: bool,
    pub earned_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementProgress>,
    pub earned_count: u64,
    pub total_points: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub new_achievements: Vec<AwardedAchievement>,
    pub total_points: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: UserStats,
    pub total_points: i64,
}

/// Dashboard aggregates.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// `YYYY-MM` of the current month.
    pub month: String,
    pub month_spend: f64,
    pub month_by_category: Vec<CategorySpend>,
    pub total_spend: f64,
    pub net_worth: NetWorth,
    pub goals: GoalSummary,
    pub bills: BillLoad,
    pub bills_due_soon: u64,
    pub total_points: i64,
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChangesQuery {
    /// Cursor from a previous response; omitted means "from the beginning".
    pub since: Option<i64>,
    /// Seconds to long-poll when nothing is pending.
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub seq: i64,
    pub table: Table,
    pub row_id: String,
    pub op: ChangeOp,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangesResponse {
    pub changes: Vec<ChangeRecord>,
    pub next_cursor: i64,
}

// ─── Advisors ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BudgetAdvisorRequest {
    pub additional_monthly_income: Option<f64>,
    #[serde(default)]
    pub focus_categories: Vec<String>,
}

/// Tax regime preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    Old,
    New,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TaxAdvisorRequest {
    pub additional_income: Option<f64>,
    pub regime: Option<TaxRegime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementAdvisorRequest {
    pub current_age: u32,
    pub retirement_age: u32,
    pub expected_return_pct: Option<f64>,
    pub inflation_pct: Option<f64>,
    pub monthly_expenses: Option<f64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DebtAdvisorRequest {
    pub extra_monthly_payment: Option<f64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NetWorthAdvisorRequest {
    pub growth_rate_pct: Option<f64>,
    pub years: Option<u32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IncomeForecastRequest {
    pub months: Option<u32>,
    pub additional_monthly_income: Option<f64>,
    pub expected_raise_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Advisor output: the locally computed aggregates plus the model's JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdvisorResponse {
    pub advisor: AdvisorKind,
    pub metrics: serde_json::Value,
    pub analysis: serde_json::Value,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code. The server converts it into a
/// JSON `{ "error": ... }` response.
#[derive(Debug)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error as `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::parse(table.as_str()), Some(table));
        }
        assert_eq!(Table::parse("users"), None);
    }

    #[test]
    fn service_error_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ServiceError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).status_code(), 409);
        let api: ApiError = (&ServiceError::Internal("boom".into())).into();
        assert_eq!(api.error, "boom");
    }

    #[test]
    fn create_expense_accepts_iso_dates() {
        let req: CreateExpenseRequest = serde_json::from_str(
            r#"{"category":"Food","amount":12.5,"date":"2025-06-01"}"#,
        )
        .unwrap();
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(req.description.is_none());
    }

    #[test]
    fn stats_response_flattens_user_stats() {
        let resp = StatsResponse {
            stats: UserStats {
                expense_count: 3,
                streak_days: 2,
                goals_completed: 1,
            },
            total_points: 110,
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["expense_count"], 3);
        assert_eq!(v["total_points"], 110);
    }
}
