use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use finquest_api::{
    Asset, ChangeOp, CreateAssetRequest, OkResponse, Table, UpdateAssetRequest, db, service,
};

use super::{delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, asset_from_row, sq_execute, sq_query_map};

/// GET /api/assets
pub async fn list_assets(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<Vec<Asset>>, ApiErr> {
    let conn = db.conn();
    let assets = sq_query_map(&conn, db::assets::list(&user.user_id), asset_from_row)
        .map_err(ApiErr::from_db("list assets"))?;
    Ok(Json(assets))
}

/// POST /api/assets
pub async fn create_asset(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<Asset>), ApiErr> {
    let now = service::now_timestamp();
    let asset = service::new_asset(&user.user_id, req, &now)?;
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            sq_execute(conn, db::assets::insert(&asset)).map_err(ApiErr::from_db("insert asset"))?;
            feed::record(conn, &user.user_id, Table::Assets, &asset.id, ChangeOp::Insert)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok((StatusCode::CREATED, Json(asset)))
}

/// PUT /api/assets/{id}
pub async fn update_asset(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<Json<Asset>, ApiErr> {
    let now = service::now_timestamp();
    let asset = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let mut asset =
                fetch_owned(conn, db::assets::get(&user.user_id, &id), asset_from_row, "asset")?;
            service::apply_asset_update(&mut asset, req, &now)?;
            sq_execute(conn, db::assets::update(&asset))
                .map_err(ApiErr::from_db("update asset"))?;
            feed::record(conn, &user.user_id, Table::Assets, &asset.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok(asset)
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(asset))
}

/// DELETE /api/assets/{id}
pub async fn delete_asset(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::assets::delete(&user.user_id, &id), "asset")?;
            feed::record(conn, &user.user_id, Table::Assets, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
