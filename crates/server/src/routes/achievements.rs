use axum::{
    Json,
    extract::State,
};
use rusqlite::Connection;

use finquest_api::{
    AchievementsResponse, AwardedAchievement, ChangeOp, EvaluateResponse, ExpenseListQuery,
    StatsResponse, Table, UserStats, db, service,
};

use super::{in_tx, list_achievements_for};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, expense_from_row, goal_from_row, sq_execute, sq_query_map};

fn current_stats(conn: &Connection, user_id: &str) -> Result<UserStats, ApiErr> {
    let expenses = sq_query_map(
        conn,
        db::expenses::list(user_id, &ExpenseListQuery::default()),
        expense_from_row,
    )
    .map_err(ApiErr::from_db("list expenses"))?;
    let goals = sq_query_map(conn, db::goals::list(user_id), goal_from_row)
        .map_err(ApiErr::from_db("list goals"))?;
    Ok(service::user_stats(&expenses, &goals, service::today()))
}

/// Evaluate the catalogue against the caller's current rows and persist any
/// newly earned achievements. Returns only the awards this call made.
pub(crate) fn award_new(
    conn: &Connection,
    user_id: &str,
    now: &str,
) -> Result<Vec<AwardedAchievement>, ApiErr> {
    let stats = current_stats(conn, user_id)?;
    let earned = list_achievements_for(conn, user_id)?;

    let mut awarded = Vec::new();
    for award in service::new_awards(user_id, &stats, &earned, now) {
        let inserted = sq_execute(conn, db::achievements::insert_or_ignore(&award))
            .map_err(ApiErr::from_db("insert achievement"))?;
        if inserted == 0 {
            continue;
        }
        feed::record(conn, user_id, Table::Achievements, &award.id, ChangeOp::Insert)
            .map_err(ApiErr::from_db("record change"))?;
        tracing::info!(
            user_id,
            achievement = %award.achievement_type,
            points = award.points,
            "achievement unlocked"
        );
        awarded.push(service::awarded(&award));
    }
    Ok(awarded)
}

/// Run [`award_new`] after a committed write.
///
/// Failure loses only the awards: the error is logged, the write stands and
/// the next evaluation sees the same stats again.
pub(crate) fn award_after_write(
    conn: &Connection,
    user_id: &str,
    now: &str,
) -> Vec<AwardedAchievement> {
    match in_tx(conn, |conn| award_new(conn, user_id, now)) {
        Ok(awarded) => awarded,
        Err(_) => {
            tracing::warn!(user_id, "achievement evaluation skipped");
            Vec::new()
        }
    }
}

/// GET /api/achievements: the catalogue with the caller's progress.
pub async fn list_achievements(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<AchievementsResponse>, ApiErr> {
    let conn = db.conn();
    let stats = current_stats(&conn, &user.user_id)?;
    let earned = list_achievements_for(&conn, &user.user_id)?;

    let achievements = service::achievement_progress(&stats, &earned);
    let earned_count = achievements.iter().filter(|a| a.earned).count() as u64;
    Ok(Json(AchievementsResponse {
        achievements,
        earned_count,
        total_points: service::total_points(&earned),
    }))
}

/// POST /api/achievements/evaluate: award anything newly earned.
pub async fn evaluate(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
) -> Result<Json<EvaluateResponse>, ApiErr> {
    let now = service::now_timestamp();
    let (new_achievements, total_points) = {
        let conn = db.conn();
        let new_achievements = in_tx(&conn, |conn| award_new(conn, &user.user_id, &now))?;
        let earned = list_achievements_for(&conn, &user.user_id)?;
        (new_achievements, service::total_points(&earned))
    };
    if !new_achievements.is_empty() {
        changes.notify(&user.user_id);
    }
    Ok(Json(EvaluateResponse {
        new_achievements,
        total_points,
    }))
}

/// GET /api/stats: aggregate counters behind the achievements.
pub async fn stats(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<StatsResponse>, ApiErr> {
    let conn = db.conn();
    let stats = current_stats(&conn, &user.user_id)?;
    let earned = list_achievements_for(&conn, &user.user_id)?;
    Ok(Json(StatsResponse {
        stats,
        total_points: service::total_points(&earned),
    }))
}
