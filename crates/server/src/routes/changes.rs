use axum::{
    Json,
    extract::{Query, State},
};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, timeout_at};

use finquest_api::{ChangesQuery, ChangesResponse, service};

use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed, ChangePage};
use crate::routes::auth::AuthUser;
use crate::storage::Db;

fn load(db: &Db, user_id: &str, since: i64) -> Result<ChangePage, ApiErr> {
    let conn = db.conn();
    feed::load_since(&conn, user_id, since, service::CHANGES_PAGE_LIMIT)
        .map_err(ApiErr::from_db("load changes"))
}

fn page(read: ChangePage, since: i64) -> Json<ChangesResponse> {
    let next_cursor = read.next_cursor(since);
    Json(ChangesResponse {
        changes: read.changes,
        next_cursor,
    })
}

/// `GET /api/changes`: the caller's change log after `since`.
///
/// Returns at most one page, oldest first. With nothing pending and `wait > 0`
/// the request blocks until one of the caller's rows changes or the wait
/// elapses. Store `next_cursor` and pass it back as `since`.
pub async fn list_changes(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Query(q): Query<ChangesQuery>,
) -> Result<Json<ChangesResponse>, ApiErr> {
    let since = q.since.unwrap_or(0).max(0);
    let wait = service::clamp_wait(q.wait);

    // Subscribe before reading so a write landing in between still wakes us.
    let mut rx = changes.subscribe();
    let pending = load(&db, &user.user_id, since)?;
    if !pending.is_empty() || wait == 0 {
        return Ok(page(pending, since));
    }

    let deadline = Instant::now() + Duration::from_secs(wait);
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Ok(user_id)) if user_id != user.user_id => continue,
            Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => {
                let pending = load(&db, &user.user_id, since)?;
                if !pending.is_empty() {
                    return Ok(page(pending, since));
                }
            }
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
    }
    Ok(page(ChangePage::default(), since))
}
