use axum::{Json, extract::State};

use finquest_api::{SummaryResponse, service};

use super::{list_achievements_for, load_snapshot};
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::storage::Db;

/// GET /api/summary: dashboard aggregates for the current month.
pub async fn summary(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<SummaryResponse>, ApiErr> {
    let (snapshot, achievements) = {
        let conn = db.conn();
        (
            load_snapshot(&conn, &user.user_id)?,
            list_achievements_for(&conn, &user.user_id)?,
        )
    };
    let summary = service::build_summary(
        &service::Snapshot {
            expenses: &snapshot.expenses,
            goals: &snapshot.goals,
            bills: &snapshot.bills,
            assets: &snapshot.assets,
            liabilities: &snapshot.liabilities,
            achievements: &achievements,
        },
        service::today(),
    );
    Ok(Json(summary))
}
