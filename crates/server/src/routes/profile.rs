use axum::{Json, extract::State};
use rusqlite::Connection;

use finquest_api::{ChangeOp, Profile, Table, UpdateProfileRequest, db, service};

use super::{fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, profile_from_row, sq_execute};

/// Load the caller's profile, creating an empty one on first access.
/// Returns whether a row was created.
fn ensure_profile(conn: &Connection, user_id: &str) -> Result<(Profile, bool), ApiErr> {
    let now = service::now_timestamp();
    let inserted = sq_execute(
        conn,
        db::profiles::insert_if_missing(&service::default_profile(user_id, &now)),
    )
    .map_err(ApiErr::from_db("create profile"))?;
    let created = inserted > 0;
    if created {
        feed::record(conn, user_id, Table::Profiles, user_id, ChangeOp::Insert)
            .map_err(ApiErr::from_db("record change"))?;
    }
    let profile = fetch_owned(conn, db::profiles::get(user_id), profile_from_row, "profile")?;
    Ok((profile, created))
}

/// GET /api/profile
pub async fn get_profile(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
) -> Result<Json<Profile>, ApiErr> {
    let (profile, created) = {
        let conn = db.conn();
        in_tx(&conn, |conn| ensure_profile(conn, &user.user_id))?
    };
    if created {
        changes.notify(&user.user_id);
    }
    Ok(Json(profile))
}

/// PUT /api/profile
pub async fn update_profile(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiErr> {
    let now = service::now_timestamp();
    let profile = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            let (mut profile, _) = ensure_profile(conn, &user.user_id)?;
            service::apply_profile_update(&mut profile, req, &now)?;
            sq_execute(conn, db::profiles::update(&profile))
                .map_err(ApiErr::from_db("update profile"))?;
            feed::record(conn, &user.user_id, Table::Profiles, &user.user_id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok(profile)
        })?
    };
    changes.notify(&user.user_id);
    Ok(Json(profile))
}
