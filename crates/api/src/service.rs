//! Shared business logic: framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters: they load rows, call into here, and
//! persist whatever comes back.

use chrono::{NaiveDate, SecondsFormat, Utc};
use finquest_core::achievements::{self, UserStats};
use finquest_core::milestones::{self, Funding};
use finquest_core::{portfolio, stats};

use crate::crypto::{self, Claims};
use crate::{
    AchievementProgress, Achievement, Asset, AwardedAchievement, Bill, BudgetAdvisorRequest,
    Category, ChatRequest, ChatRole, CreateAssetRequest, CreateBillRequest, CreateCategoryRequest, CreateExpenseRequest,
    CreateGoalRequest, CreateLiabilityRequest, DebtAdvisorRequest, Expense, Goal,
    IncomeForecastRequest, Liability, Milestone, NetWorthAdvisorRequest, Profile,
    RetirementAdvisorRequest, ServiceError, TaxAdvisorRequest, SummaryResponse, UpdateAssetRequest,
    UpdateBillRequest, UpdateCategoryRequest, UpdateExpenseRequest, UpdateGoalRequest,
    UpdateLiabilityRequest, UpdateProfileRequest,
};

/// Default window for `GET /api/bills/upcoming`.
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;
pub const MAX_UPCOMING_DAYS: u32 = 366;

/// Longest a change-feed request may block.
pub const MAX_WAIT_SECS: u64 = 30;
/// Page size of the change feed.
pub const CHANGES_PAGE_LIMIT: u64 = 200;

pub const DEFAULT_FORECAST_MONTHS: u32 = 6;
pub const MAX_FORECAST_MONTHS: u32 = 24;

pub const MAX_CHAT_MESSAGES: usize = 20;
pub const MAX_PROJECTION_YEARS: u32 = 50;
const MAX_CHAT_MESSAGE_LEN: usize = 4000;
const MAX_TEXT_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

// ─── Ids & Timestamps ───────────────────────────────────────────────────────

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// RFC 3339 UTC timestamp with second precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ─── Validation ─────────────────────────────────────────────────────────────

/// Amounts must be finite and non-negative.
pub fn validate_amount(field: &str, value: f64) -> Result<f64, ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

/// Percent rates are accepted in `0..=100`.
pub fn validate_rate(field: &str, value: f64) -> Result<f64, ServiceError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be between 0 and 100"
        )));
    }
    Ok(value)
}

/// Trim and bound a required short text field.
pub fn validate_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be 1-{MAX_TEXT_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional free text; blank collapses to `None`.
pub fn validate_description(value: Option<String>) -> Result<Option<String>, ServiceError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::BadRequest(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

// ─── Auth ───────────────────────────────────────────────────────────────────

/// Resolve an `Authorization` header value into verified claims.
pub fn resolve_bearer(
    header: Option<&str>,
    jwt_secret: &str,
    now_unix: u64,
) -> Result<Claims, ServiceError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;

    if jwt_secret.is_empty() {
        return Err(ServiceError::Unauthorized(
            "JWT authentication not configured".into(),
        ));
    }

    crypto::verify_jwt(token, jwt_secret, now_unix)
}

// ─── Query Parameter Clamping ───────────────────────────────────────────────

pub fn clamp_wait(wait: Option<u64>) -> u64 {
    wait.unwrap_or(0).min(MAX_WAIT_SECS)
}

pub fn clamp_upcoming_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_UPCOMING_DAYS).min(MAX_UPCOMING_DAYS)
}

pub fn clamp_forecast_months(months: Option<u32>) -> u32 {
    months
        .unwrap_or(DEFAULT_FORECAST_MONTHS)
        .clamp(1, MAX_FORECAST_MONTHS)
}

// ─── Expenses ───────────────────────────────────────────────────────────────

pub fn new_expense(
    user_id: &str,
    req: CreateExpenseRequest,
    now: &str,
) -> Result<Expense, ServiceError> {
    Ok(Expense {
        id: new_id(),
        user_id: user_id.to_string(),
        category: validate_text("category", &req.category)?,
        amount: validate_amount("amount", req.amount)?,
        date: req.date,
        description: validate_description(req.description)?,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

pub fn apply_expense_update(
    expense: &mut Expense,
    req: UpdateExpenseRequest,
    now: &str,
) -> Result<(), ServiceError> {
    if let Some(category) = req.category {
        expense.category = validate_text("category", &category)?;
    }
    if let Some(amount) = req.amount {
        expense.amount = validate_amount("amount", amount)?;
    }
    if let Some(date) = req.date {
        expense.date = date;
    }
    if req.description.is_some() {
        expense.description = validate_description(req.description)?;
    }
    expense.updated_at = now.to_string();
    Ok(())
}

// ─── Goals ──────────────────────────────────────────────────────────────────

pub fn new_goal(user_id: &str, req: CreateGoalRequest, now: &str) -> Result<Goal, ServiceError> {
    let mut goal = Goal {
        id: new_id(),
        user_id: user_id.to_string(),
        title: validate_text("title", &req.title)?,
        target_amount: validate_amount("target_amount", req.target_amount)?,
        current_amount: validate_amount("current_amount", req.current_amount)?,
        target_date: req.target_date,
        completed_at: None,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    settle_completion(&mut goal, now);
    Ok(goal)
}

/// Apply a goal update and detect the progress milestone it produced.
///
/// The milestone compares progress before the update (old amount against the
/// old target) with progress after it.
pub fn apply_goal_update(
    goal: &mut Goal,
    req: UpdateGoalRequest,
    now: &str,
) -> Result<Option<Milestone>, ServiceError> {
    let before = Funding::new(goal.current_amount, goal.target_amount);
    if let Some(title) = req.title {
        goal.title = validate_text("title", &title)?;
    }
    if let Some(target) = req.target_amount {
        goal.target_amount = validate_amount("target_amount", target)?;
    }
    if let Some(current) = req.current_amount {
        goal.current_amount = validate_amount("current_amount", current)?;
    }
    if req.target_date.is_some() {
        goal.target_date = req.target_date;
    }
    goal.updated_at = now.to_string();

    let milestone = milestones::detect(
        &goal.title,
        before,
        Funding::new(goal.current_amount, goal.target_amount),
    );
    settle_completion(goal, now);
    Ok(milestone)
}

/// Keep `completed_at` in step with the current amount.
fn settle_completion(goal: &mut Goal, now: &str) {
    if goal.is_completed() {
        if goal.completed_at.is_none() {
            goal.completed_at = Some(now.to_string());
        }
    } else {
        goal.completed_at = None;
    }
}

// ─── Bills ──────────────────────────────────────────────────────────────────

pub fn new_bill(user_id: &str, req: CreateBillRequest, now: &str) -> Result<Bill, ServiceError> {
    Ok(Bill {
        id: new_id(),
        user_id: user_id.to_string(),
        title: validate_text("title", &req.title)?,
        amount: validate_amount("amount", req.amount)?,
        frequency: req.frequency,
        due_date: req.due_date,
        is_paid: false,
        category: req
            .category
            .map(|c| validate_text("category", &c))
            .transpose()?,
        paid_at: None,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

pub fn apply_bill_update(
    bill: &mut Bill,
    req: UpdateBillRequest,
    now: &str,
) -> Result<(), ServiceError> {
    if let Some(title) = req.title {
        bill.title = validate_text("title", &title)?;
    }
    if let Some(amount) = req.amount {
        bill.amount = validate_amount("amount", amount)?;
    }
    if let Some(frequency) = req.frequency {
        bill.frequency = frequency;
    }
    if let Some(due_date) = req.due_date {
        bill.due_date = due_date;
    }
    if let Some(category) = req.category {
        bill.category = Some(validate_text("category", &category)?);
    }
    if let Some(is_paid) = req.is_paid {
        if is_paid && !bill.is_paid {
            bill.paid_at = Some(now.to_string());
        } else if !is_paid {
            bill.paid_at = None;
        }
        bill.is_paid = is_paid;
    }
    bill.updated_at = now.to_string();
    Ok(())
}

/// Mark a bill paid. Recurring bills yield the next unpaid occurrence.
pub fn pay_bill(bill: &mut Bill, now: &str) -> Result<Option<Bill>, ServiceError> {
    if bill.is_paid {
        return Err(ServiceError::Conflict("bill is already paid".into()));
    }
    bill.is_paid = true;
    bill.paid_at = Some(now.to_string());
    bill.updated_at = now.to_string();

    let Some(next_due) = bill.frequency.next_due(bill.due_date) else {
        return Ok(None);
    };
    Ok(Some(Bill {
        id: new_id(),
        due_date: next_due,
        is_paid: false,
        paid_at: None,
        created_at: now.to_string(),
        updated_at: now.to_string(),
        ..bill.clone()
    }))
}

// ─── Assets / Liabilities ───────────────────────────────────────────────────

pub fn new_asset(user_id: &str, req: CreateAssetRequest, now: &str) -> Result<Asset, ServiceError> {
    let purchase_value = validate_amount("purchase_value", req.purchase_value)?;
    let current_value = match req.current_value {
        Some(v) => validate_amount("current_value", v)?,
        None => purchase_value,
    };
    Ok(Asset {
        id: new_id(),
        user_id: user_id.to_string(),
        name: validate_text("name", &req.name)?,
        asset_type: validate_text("asset_type", &req.asset_type)?,
        purchase_value,
        current_value,
        depreciation_rate: validate_rate("depreciation_rate", req.depreciation_rate)?,
        purchase_date: req.purchase_date,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

pub fn apply_asset_update(
    asset: &mut Asset,
    req: UpdateAssetRequest,
    now: &str,
) -> Result<(), ServiceError> {
    if let Some(name) = req.name {
        asset.name = validate_text("name", &name)?;
    }
    if let Some(asset_type) = req.asset_type {
        asset.asset_type = validate_text("asset_type", &asset_type)?;
    }
    if let Some(v) = req.purchase_value {
        asset.purchase_value = validate_amount("purchase_value", v)?;
    }
    if let Some(v) = req.current_value {
        asset.current_value = validate_amount("current_value", v)?;
    }
    if let Some(rate) = req.depreciation_rate {
        asset.depreciation_rate = validate_rate("depreciation_rate", rate)?;
    }
    if req.purchase_date.is_some() {
        asset.purchase_date = req.purchase_date;
    }
    asset.updated_at = now.to_string();
    Ok(())
}

pub fn new_liability(
    user_id: &str,
    req: CreateLiabilityRequest,
    now: &str,
) -> Result<Liability, ServiceError> {
    let principal_amount = validate_amount("principal_amount", req.principal_amount)?;
    let outstanding_amount = match req.outstanding_amount {
        Some(v) => validate_amount("outstanding_amount", v)?,
        None => principal_amount,
    };
    Ok(Liability {
        id: new_id(),
        user_id: user_id.to_string(),
        name: validate_text("name", &req.name)?,
        liability_type: validate_text("liability_type", &req.liability_type)?,
        principal_amount,
        outstanding_amount,
        interest_rate: validate_rate("interest_rate", req.interest_rate)?,
        emi_amount: validate_amount("emi_amount", req.emi_amount)?,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    })
}

pub fn apply_liability_update(
    liability: &mut Liability,
    req: UpdateLiabilityRequest,
    now: &str,
) -> Result<(), ServiceError> {
    if let Some(name) = req.name {
        liability.name = validate_text("name", &name)?;
    }
    if let Some(t) = req.liability_type {
        liability.liability_type = validate_text("liability_type", &t)?;
    }
    if let Some(v) = req.principal_amount {
        liability.principal_amount = validate_amount("principal_amount", v)?;
    }
    if let Some(v) = req.outstanding_amount {
        liability.outstanding_amount = validate_amount("outstanding_amount", v)?;
    }
    if let Some(rate) = req.interest_rate {
        liability.interest_rate = validate_rate("interest_rate", rate)?;
    }
    if let Some(v) = req.emi_amount {
        liability.emi_amount = validate_amount("emi_amount", v)?;
    }
    liability.updated_at = now.to_string();
    Ok(())
}

// ─── Categories / Profile ───────────────────────────────────────────────────

pub fn new_category(
    user_id: &str,
    req: CreateCategoryRequest,
    now: &str,
) -> Result<Category, ServiceError> {
    let name = validate_text("name", &req.name)?;
    if finquest_core::is_builtin_category(&name) {
        return Err(ServiceError::Conflict(format!(
            "'{name}' is a built-in category"
        )));
    }
    Ok(Category {
        id: new_id(),
        user_id: user_id.to_string(),
        name,
        icon: validate_text("icon", &req.icon)?,
        created_at: now.to_string(),
    })
}

pub fn apply_category_update(
    category: &mut Category,
    req: UpdateCategoryRequest,
) -> Result<(), ServiceError> {
    if let Some(name) = req.name {
        let name = validate_text("name", &name)?;
        if finquest_core::is_builtin_category(&name) {
            return Err(ServiceError::Conflict(format!(
                "'{name}' is a built-in category"
            )));
        }
        category.name = name;
    }
    if let Some(icon) = req.icon {
        category.icon = validate_text("icon", &icon)?;
    }
    Ok(())
}

pub fn default_profile(user_id: &str, now: &str) -> Profile {
    Profile {
        user_id: user_id.to_string(),
        annual_salary: 0.0,
        display_name: None,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

pub fn apply_profile_update(
    profile: &mut Profile,
    req: UpdateProfileRequest,
    now: &str,
) -> Result<(), ServiceError> {
    if let Some(salary) = req.annual_salary {
        profile.annual_salary = validate_amount("annual_salary", salary)?;
    }
    if let Some(name) = req.display_name {
        let trimmed = name.trim();
        profile.display_name = if trimmed.is_empty() {
            None
        } else {
            Some(validate_text("display_name", trimmed)?)
        };
    }
    profile.updated_at = now.to_string();
    Ok(())
}

// ─── Achievements ───────────────────────────────────────────────────────────

/// Statistics snapshot the evaluator runs against.
pub fn user_stats(expenses: &[Expense], goals: &[Goal], today: NaiveDate) -> UserStats {
    UserStats {
        expense_count: expenses.len() as u64,
        streak_days: stats::streak_days(expenses.iter().map(|e| e.date), today),
        goals_completed: stats::goals_completed(goals),
    }
}

/// Awards for achievements that newly qualify. Nothing is persisted here.
pub fn new_awards(
    user_id: &str,
    stats: &UserStats,
    earned: &[Achievement],
    now: &str,
) -> Vec<Achievement> {
    achievements::newly_earned(stats, earned.iter().map(|a| a.achievement_type.as_str()))
        .into_iter()
        .map(|def| Achievement {
            id: new_id(),
            user_id: user_id.to_string(),
            achievement_type: def.id.to_string(),
            points: def.points,
            earned_at: now.to_string(),
        })
        .collect()
}

pub fn awarded(achievement: &Achievement) -> AwardedAchievement {
    let name = achievements::find(&achievement.achievement_type)
        .map(|def| def.name)
        .unwrap_or(achievement.achievement_type.as_str());
    AwardedAchievement {
        achievement_type: achievement.achievement_type.clone(),
        name: name.to_string(),
        points: achievement.points,
        earned_at: achievement.earned_at.clone(),
    }
}

pub fn total_points(earned: &[Achievement]) -> i64 {
    achievements::total_points(earned.iter().map(|a| a.achievement_type.as_str()))
}

/// Every catalogue entry with the caller's progress.
pub fn achievement_progress(stats: &UserStats, earned: &[Achievement]) -> Vec<AchievementProgress> {
    achievements::CATALOGUE
        .iter()
        .map(|def| {
            let award = earned.iter().find(|a| a.achievement_type == def.id);
            AchievementProgress {
                id: def.id.to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                metric: def.metric,
                threshold: def.threshold,
                current: stats.value(def.metric),
                points: def.points,
                progress_pct: if award.is_some() {
                    100.0
                } else {
                    def.progress_pct(stats)
                },
                earned: award.is_some(),
                earned_at: award.map(|a| a.earned_at.clone()),
            }
        })
        .collect()
}

// ─── Dashboard ──────────────────────────────────────────────────────────────

/// Rows a dashboard summary is computed from.
pub struct Snapshot<'a> {
    pub expenses: &'a [Expense],
    pub goals: &'a [Goal],
    pub bills: &'a [Bill],
    pub assets: &'a [Asset],
    pub liabilities: &'a [Liability],
    pub achievements: &'a [Achievement],
}

pub fn build_summary(snapshot: &Snapshot<'_>, today: NaiveDate) -> SummaryResponse {
    let month_from = finquest_core::month_start(today);
    let this_month = stats::filter_by_range(snapshot.expenses, Some(month_from), Some(today));
    SummaryResponse {
        month: finquest_core::month_key(today),
        month_spend: stats::total_spend(this_month.iter().copied()),
        month_by_category: stats::spend_by_category(this_month.iter().copied()),
        total_spend: stats::total_spend(snapshot.expenses),
        net_worth: portfolio::net_worth(snapshot.assets, snapshot.liabilities),
        goals: stats::goal_summary(snapshot.goals),
        bills: stats::bill_load(snapshot.bills, today),
        bills_due_soon: snapshot
            .bills
            .iter()
            .filter(|b| b.is_due_within(today, DEFAULT_UPCOMING_DAYS))
            .count() as u64,
        total_points: total_points(snapshot.achievements),
    }
}

// ─── Advisor Payloads ───────────────────────────────────────────────────────

fn validate_optional_amount(field: &str, value: Option<f64>) -> Result<(), ServiceError> {
    value.map_or(Ok(()), |v| validate_amount(field, v).map(|_| ()))
}

fn validate_optional_rate(field: &str, value: Option<f64>) -> Result<(), ServiceError> {
    value.map_or(Ok(()), |v| validate_rate(field, v).map(|_| ()))
}

pub fn validate_budget(req: &BudgetAdvisorRequest) -> Result<(), ServiceError> {
    validate_optional_amount("additional_monthly_income", req.additional_monthly_income)?;
    for category in &req.focus_categories {
        validate_text("focus_categories", category)?;
    }
    Ok(())
}

pub fn validate_tax(req: &TaxAdvisorRequest) -> Result<(), ServiceError> {
    validate_optional_amount("additional_income", req.additional_income)
}

pub fn validate_debt(req: &DebtAdvisorRequest) -> Result<(), ServiceError> {
    validate_optional_amount("extra_monthly_payment", req.extra_monthly_payment)
}

pub fn validate_net_worth(req: &NetWorthAdvisorRequest) -> Result<(), ServiceError> {
    validate_optional_rate("growth_rate_pct", req.growth_rate_pct)?;
    if let Some(years) = req.years
        && !(1..=MAX_PROJECTION_YEARS).contains(&years)
    {
        return Err(ServiceError::BadRequest(format!(
            "years must be between 1 and {MAX_PROJECTION_YEARS}"
        )));
    }
    Ok(())
}

pub fn validate_income_forecast(req: &IncomeForecastRequest) -> Result<(), ServiceError> {
    validate_optional_amount("additional_monthly_income", req.additional_monthly_income)?;
    validate_optional_rate("expected_raise_pct", req.expected_raise_pct)
}

pub fn validate_retirement(req: &RetirementAdvisorRequest) -> Result<(), ServiceError> {
    if req.current_age == 0 || req.current_age >= 120 {
        return Err(ServiceError::BadRequest(
            "current_age must be between 1 and 119".into(),
        ));
    }
    if req.retirement_age <= req.current_age || req.retirement_age > 120 {
        return Err(ServiceError::BadRequest(
            "retirement_age must be greater than current_age and at most 120".into(),
        ));
    }
    validate_optional_rate("expected_return_pct", req.expected_return_pct)?;
    validate_optional_rate("inflation_pct", req.inflation_pct)?;
    validate_optional_amount("monthly_expenses", req.monthly_expenses)
}

pub fn validate_chat(req: &ChatRequest) -> Result<(), ServiceError> {
    if req.messages.is_empty() || req.messages.len() > MAX_CHAT_MESSAGES {
        return Err(ServiceError::BadRequest(format!(
            "messages must contain 1-{MAX_CHAT_MESSAGES} entries"
        )));
    }
    if req.messages.last().map(|m| m.role) != Some(ChatRole::User) {
        return Err(ServiceError::BadRequest(
            "last message must come from the user".into(),
        ));
    }
    for m in &req.messages {
        let len = m.content.trim().chars().count();
        if len == 0 || len > MAX_CHAT_MESSAGE_LEN {
            return Err(ServiceError::BadRequest(format!(
                "message content must be 1-{MAX_CHAT_MESSAGE_LEN} characters"
            )));
        }
    }
    Ok(())
}
