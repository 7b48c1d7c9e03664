//! `POST /api/advisor/*`: each handler validates the scenario payload, loads
//! the caller's rows, reduces them and forwards a prompt to the LLM gateway.

use axum::{Json, extract::State};
use chrono::NaiveDate;

use finquest_advisor::{AdvisorCall, FinancialSnapshot};
use finquest_api::{
    AdvisorResponse, BudgetAdvisorRequest, ChatRequest, DebtAdvisorRequest, IncomeForecastRequest,
    NetWorthAdvisorRequest, RetirementAdvisorRequest, TaxAdvisorRequest, service,
};

use super::load_snapshot;
use crate::Advisor;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::storage::Db;

/// Build the call from the caller's snapshot and send it. The DB lock is
/// released before the gateway request starts.
async fn run<F>(
    db: &Db,
    advisor: &Advisor,
    user: &AuthUser,
    build: F,
) -> Result<Json<AdvisorResponse>, ApiErr>
where
    F: FnOnce(&FinancialSnapshot, NaiveDate) -> AdvisorCall,
{
    let client = advisor.client()?;
    let snapshot = {
        let conn = db.conn();
        load_snapshot(&conn, &user.user_id)?
    };
    let call = build(&snapshot, service::today());
    tracing::debug!(user_id = %user.user_id, advisor = call.kind.as_str(), "calling advisor");
    Ok(Json(call.run(&client).await?))
}

pub async fn budget(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<BudgetAdvisorRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_budget(&req)?;
    run(&db, &advisor, &user, |s, today| AdvisorCall::budget(s, &req, today)).await
}

pub async fn tax(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<TaxAdvisorRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_tax(&req)?;
    run(&db, &advisor, &user, |s, today| AdvisorCall::tax(s, &req, today)).await
}

pub async fn retirement(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<RetirementAdvisorRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_retirement(&req)?;
    run(&db, &advisor, &user, |s, today| {
        AdvisorCall::retirement(s, &req, today)
    })
    .await
}

pub async fn debt(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<DebtAdvisorRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_debt(&req)?;
    run(&db, &advisor, &user, |s, _| AdvisorCall::debt(s, &req)).await
}

pub async fn net_worth(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<NetWorthAdvisorRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_net_worth(&req)?;
    run(&db, &advisor, &user, |s, today| {
        AdvisorCall::net_worth(s, &req, today)
    })
    .await
}

pub async fn income_forecast(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<IncomeForecastRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_income_forecast(&req)?;
    let months = service::clamp_forecast_months(req.months);
    run(&db, &advisor, &user, |s, today| {
        AdvisorCall::income_forecast(s, &req, months, today)
    })
    .await
}

pub async fn chat(
    State(db): State<Db>,
    State(advisor): State<Advisor>,
    user: AuthUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<AdvisorResponse>, ApiErr> {
    service::validate_chat(&req)?;
    run(&db, &advisor, &user, |s, today| AdvisorCall::chat(s, &req, today)).await
}
