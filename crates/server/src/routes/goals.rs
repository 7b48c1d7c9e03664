use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use finquest_api::{
    ChangeOp, CreateGoalRequest, Goal, GoalResponse, OkResponse, Table, UpdateGoalRequest, db,
    service,
};

use super::{achievements, delete_owned, fetch_owned, in_tx};
use crate::error::ApiErr;
use crate::feed::{self, ChangeFeed};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, goal_from_row, sq_execute, sq_query_map};

/// GET /api/goals
pub async fn list_goals(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<Vec<Goal>>, ApiErr> {
    let conn = db.conn();
    let goals = sq_query_map(&conn, db::goals::list(&user.user_id), goal_from_row)
        .map_err(ApiErr::from_db("list goals"))?;
    Ok(Json(goals))
}

/// POST /api/goals
pub async fn create_goal(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiErr> {
    let now = service::now_timestamp();
    let goal = service::new_goal(&user.user_id, req, &now)?;

    let new_achievements = {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            sq_execute(conn, db::goals::insert(&goal)).map_err(ApiErr::from_db("insert goal"))?;
            feed::record(conn, &user.user_id, Table::Goals, &goal.id, ChangeOp::Insert)
                .map_err(ApiErr::from_db("record change"))
        })?;
        achievements::award_after_write(&conn, &user.user_id, &now)
    };
    changes.notify(&user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(GoalResponse {
            goal,
            milestone: None,
            new_achievements,
        }),
    ))
}

/// PUT /api/goals/{id}: update a goal; progress changes may fire a milestone.
pub async fn update_goal(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<GoalResponse>, ApiErr> {
    let now = service::now_timestamp();

    let (goal, milestone, new_achievements) = {
        let conn = db.conn();
        let (goal, milestone) = in_tx(&conn, |conn| {
            let mut goal =
                fetch_owned(conn, db::goals::get(&user.user_id, &id), goal_from_row, "goal")?;
            let milestone = service::apply_goal_update(&mut goal, req, &now)?;
            sq_execute(conn, db::goals::update(&goal)).map_err(ApiErr::from_db("update goal"))?;
            feed::record(conn, &user.user_id, Table::Goals, &goal.id, ChangeOp::Update)
                .map_err(ApiErr::from_db("record change"))?;
            Ok((goal, milestone))
        })?;
        let new_achievements = achievements::award_after_write(&conn, &user.user_id, &now);
        (goal, milestone, new_achievements)
    };
    changes.notify(&user.user_id);

    if let Some(m) = &milestone {
        tracing::info!(user_id = %user.user_id, goal_id = %goal.id, "{}", m.message);
    }

    Ok(Json(GoalResponse {
        goal,
        milestone,
        new_achievements,
    }))
}

/// DELETE /api/goals/{id}
pub async fn delete_goal(
    State(db): State<Db>,
    State(changes): State<ChangeFeed>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    {
        let conn = db.conn();
        in_tx(&conn, |conn| {
            delete_owned(conn, db::goals::delete(&user.user_id, &id), "goal")?;
            feed::record(conn, &user.user_id, Table::Goals, &id, ChangeOp::Delete)
                .map_err(ApiErr::from_db("record change"))
        })?;
    }
    changes.notify(&user.user_id);
    Ok(Json(OkResponse { ok: true }))
}
