use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use finquest_api::{
    ChangeOp, CreateLiabilityRequest, Liability, OkResponse, Table, UpdateLiabilityRequest, db,
    service,
};

use super::{delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, liability_from_row, sq_execute, sq_query_map};

/// GET /api/liabilities
pub async fn list_liabilities(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<Vec<Liability>>, ApiErr> {
    let conn = db.conn();
    let liabilities = sq_query_map(
        &conn,
        db::liabilities::list(&user.user_id),
        liability_from_row,
    )
    .map_err(ApiErr::from_db("list liabilities"))?;
    Ok(Json(liabilities))
}

/// POST /api/liabilities: `outstanding_amount` defaults to the principal.
pub async fn create_liability(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateLiabilityRequest>,
) -> Result<(StatusCode, Json<Liability>), ApiErr> {
    let now = service::now_timestamp();
    let liability = service::new_liability(&user.user_id, req, &now)?;
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            sq_execute(conn, db::liabilities::insert(&liability))
                .map_err(ApiErr::from_db("insert liability"))?;
            feed::record(
                conn,
                &user.user_id,
                Table::Liabilities,
                &liability.id,
                ChangeOp::Insert,
            )
            .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok((StatusCode::CREATED, Json(liability)))
}

/// PUT /api/liabilities/{id}
pub async fn update_liability(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateLiabilityRequest>,
) -> Result<Json<Liability>, ApiErr> {
    let now = service::now_timestamp();
    let liability = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let mut liability = fetch_owned(
                conn,
                db::liabilities::get(&user.user_id, &id),
                liability_from_row,
                "liability",
            )?;
            service::apply_liability_update(&mut liability, req, &now)?;
            sq_execute(conn, db::liabilities::update(&liability))
                .map_err(ApiErr::from_db("update liability"))?;
            feed::record(
                conn,
                &user.user_id,
                Table::Liabilities,
                &liability.id,
                ChangeOp::Update,
            )
            .map_err(ApiErr::from_db("record change"))?;
            Ok(liability)
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(liability))
}

/// DELETE /api/liabilities/{id}
pub async fn delete_liability(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::liabilities::delete(&user.user_id, &id), "liability")?;
            feed::record(conn, &user.user_id, Table::Liabilities, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
