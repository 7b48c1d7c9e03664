use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use finquest_api::{
    CategoriesResponse, Category, CategoryInfo, ChangeOp, CreateCategoryRequest, OkResponse,
    Table, UpdateCategoryRequest, db, service,
};
use finquest_core::BUILTIN_CATEGORIES;

use super::{delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, category_from_row, is_constraint_violation, sq_execute, sq_query_map};

fn write_category(conn: &rusqlite::Connection, built: db::Built, name: &str) -> Result<(), ApiErr> {
    match sq_execute(conn, built) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => Err(ApiErr::conflict(format!(
            "category '{name}' already exists"
        ))),
        Err(e) => Err(ApiErr::from_db("write category")(e)),
    }
}

/// GET /api/categories: built-in categories plus the caller's custom ones.
pub async fn list_categories(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<CategoriesResponse>, ApiErr> {
    let custom = {
        let conn = db.conn();
        sq_query_map(&conn, db::categories::list(&user.user_id), category_from_row)
            .map_err(ApiErr::from_db("list categories"))?
    };
    let builtin = BUILTIN_CATEGORIES
        .iter()
        .map(|c| CategoryInfo {
            name: c.name.to_string(),
            icon: c.icon.to_string(),
        })
        .collect();
    Ok(Json(CategoriesResponse { builtin, custom }))
}

/// POST /api/categories: names are unique per user, case-insensitively.
pub async fn create_category(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiErr> {
    let now = service::now_timestamp();
    let category = service::new_category(&user.user_id, req, &now)?;
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            write_category(conn, db::categories::insert(&category), &category.name)?;
            feed::record(conn, &user.user_id, Table::Categories, &category.id, ChangeOp::Insert)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiErr> {
    let category = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let mut category = fetch_owned(
                conn,
                db::categories::get(&user.user_id, &id),
                category_from_row,
                "category",
            )?;
            service::apply_category_update(&mut category, req)?;
            write_category(conn, db::categories::update(&category), &category.name)?;
            feed::record(conn, &user.user_id, Table::Categories, &category.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok(category)
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(category))
}

/// DELETE /api/categories/{id}: expenses keep their category text.
pub async fn delete_category(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::categories::delete(&user.user_id, &id), "category")?;
            feed::record(conn, &user.user_id, Table::Categories, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
