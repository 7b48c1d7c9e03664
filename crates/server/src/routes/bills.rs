use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use finquest_api::{
    Bill, BillListQuery, ChangeOp, CreateBillRequest, OkResponse, PayBillResponse, Table,
    UpcomingBillsQuery, UpcomingBillsResponse, UpdateBillRequest, db, service,
};

use super::{delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, bill_from_row, sq_execute, sq_query_map};

/// GET /api/bills: ordered by due date; `?unpaid=true` hides paid bills.
pub async fn list_bills(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<BillListQuery>,
) -> Result<Json<Vec<Bill>>, ApiErr> {
    let conn = db.conn();
    let bills = sq_query_map(
        &conn,
        db::bills::list(&user.user_id, q.unpaid.unwrap_or(false)),
        bill_from_row,
    )
    .map_err(ApiErr::from_db("list bills"))?;
    Ok(Json(bills))
}

/// GET /api/bills/upcoming: unpaid bills due within `days`, plus overdue ones.
pub async fn upcoming_bills(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<UpcomingBillsQuery>,
) -> Result<Json<UpcomingBillsResponse>, ApiErr> {
    let days = service::clamp_upcoming_days(q.days);
    let today = service::today();
    let unpaid = {
        let conn = db.conn();
        sq_query_map(&conn, db::bills::list(&user.user_id, true), bill_from_row)
            .map_err(ApiErr::from_db("list bills"))?
    };

    let (overdue, rest): (Vec<Bill>, Vec<Bill>) =
        unpaid.into_iter().partition(|b| b.is_overdue(today));
    let due_soon = rest
        .into_iter()
        .filter(|b| b.is_due_within(today, days))
        .collect();

    Ok(Json(UpcomingBillsResponse {
        days,
        due_soon,
        overdue,
    }))
}

/// POST /api/bills
pub async fn create_bill(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<Bill>), ApiErr> {
    let now = service::now_timestamp();
    let bill = service::new_bill(&user.user_id, req, &now)?;
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            sq_execute(conn, db::bills::insert(&bill)).map_err(ApiErr::from_db("insert bill"))?;
            feed::record(conn, &user.user_id, Table::Bills, &bill.id, ChangeOp::Insert)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok((StatusCode::CREATED, Json(bill)))
}

/// PUT /api/bills/{id}
pub async fn update_bill(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateBillRequest>,
) -> Result<Json<Bill>, ApiErr> {
    let now = service::now_timestamp();
    let bill = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let mut bill =
                fetch_owned(conn, db::bills::get(&user.user_id, &id), bill_from_row, "bill")?;
            service::apply_bill_update(&mut bill, req, &now)?;
            sq_execute(conn, db::bills::update(&bill)).map_err(ApiErr::from_db("update bill"))?;
            feed::record(conn, &user.user_id, Table::Bills, &bill.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok(bill)
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(bill))
}

/// POST /api/bills/{id}/pay: mark paid; a recurring bill gets an unpaid successor.
pub async fn pay_bill(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PayBillResponse>, ApiErr> {
    let now = service::now_timestamp();
    let (bill, next_bill) = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let mut bill =
                fetch_owned(conn, db::bills::get(&user.user_id, &id), bill_from_row, "bill")?;
            let next_bill = service::pay_bill(&mut bill, &now)?;
            sq_execute(conn, db::bills::update(&bill)).map_err(ApiErr::from_db("update bill"))?;
            feed::record(conn, &user.user_id, Table::Bills, &bill.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            if let Some(next) = &next_bill {
                sq_execute(conn, db::bills::insert(next))
                    .map_err(ApiErr::from_db("insert bill"))?;
                feed::record(conn, &user.user_id, Table::Bills, &next.id, ChangeOp::Insert)
                    .map_err(ApiErr::from_db("record change"))?;
            }
            Ok((bill, next_bill))
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(PayBillResponse { bill, next_bill }))
}

/// DELETE /api/bills/{id}
pub async fn delete_bill(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::bills::delete(&user.user_id, &id), "bill")?;
            feed::record(conn, &user.user_id, Table::Bills, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
