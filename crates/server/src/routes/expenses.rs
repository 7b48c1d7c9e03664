use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use finquest_api::{
    ChangeOp, CreateExpenseRequest, Expense, ExpenseListQuery, ExpenseResponse, OkResponse,
    Table, UpdateExpenseRequest, db, service,
};

use super::{achievements, delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, expense_from_row, sq_execute, sq_query_map};

/// GET /api/expenses: the caller's expenses, newest first.
pub async fn list_expenses(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<ExpenseListQuery>,
) -> Result<Json<Vec<Expense>>, ApiErr> {
    let conn = db.conn();
    let expenses = sq_query_map(&conn, db::expenses::list(&user.user_id, &q), expense_from_row)
        .map_err(ApiErr::from_db("list expenses"))?;
    Ok(Json(expenses))
}

/// POST /api/expenses: record an expense, then run the achievement evaluator.
pub async fn create_expense(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiErr> {
    let now = service::now_timestamp();
    let expense = service::new_expense(&user.user_id, req, &now)?;

    let new_achievements = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            sq_execute(conn, db::expenses::insert(&expense))
                .map_err(ApiErr::from_db("insert expense"))?;
            feed::record(conn, &user.user_id, Table::Expenses, &expense.id, ChangeOp::Insert)
                .map_err(ApiErr::from_db("record change"))
        })?;
        achievements::award_after_write(&conn, &user.user_id, &now)
    };
    changes.notify(&user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(ExpenseResponse {
            expense,
            new_achievements,
        }),
    ))
}

/// PUT /api/expenses/{id}
pub async fn update_expense(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, ApiErr> {
    let now = service::now_timestamp();

    let (expense, new_achievements) = {
        let conn = db.conn();
        let expense = in_tx(&conn, |conn| {
            let mut expense = fetch_owned(
                conn,
                db::expenses::get(&user.user_id, &id),
                expense_from_row,
                "expense",
            )?;
            service::apply_expense_update(&mut expense, req, &now)?;
            sq_execute(conn, db::expenses::update(&expense))
                .map_err(ApiErr::from_db("update expense"))?;
            feed::record(conn, &user.user_id, Table::Expenses, &expense.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok(expense)
        })?;
        let new_achievements = achievements::award_after_write(&conn, &user.user_id, &now);
        (expense, new_achievements)
    };
    changes.notify(&user.user_id);

    Ok(Json(ExpenseResponse {
        expense,
        new_achievements,
    }))
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::expenses::delete(&user.user_id, &id), "expense")?;
            feed::record(conn, &user.user_id, Table::Expenses, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
