pub mod achievements;
pub mod advisor;
pub mod assets;
pub mod auth;
pub mod bills;
pub mod capabilities;
pub mod categories;
pub mod changes;
pub mod expenses;
pub mod goals;
pub mod health;
pub mod liabilities;
pub mod profile;
pub mod summary;

use finquest_advisor::FinancialSnapshot;
use finquest_api::db::{self, Built};
use finquest_api::{Achievement, ExpenseListQuery};
use rusqlite::{Connection, Row};

use crate::error::ApiErr;
use crate::storage::{
    achievement_from_row, asset_from_row, bill_from_row, expense_from_row, goal_from_row,
    liability_from_row, profile_from_row, sq_execute, sq_query_map, sq_query_opt,
};

/// Run `f` in one transaction: every statement it issues lands, or none does.
fn in_tx<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, ApiErr>,
) -> Result<T, ApiErr> {
    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let out = f(&tx)?;
    tx.commit().map_err(ApiErr::from_db("commit transaction"))?;
    Ok(out)
}

/// Fetch one row owned by the caller; missing and foreign rows are both 404.
fn fetch_owned<T>(
    conn: &Connection,
    built: Built,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
    what: &str,
) -> Result<T, ApiErr> {
    sq_query_opt(conn, built, map)
        .map_err(ApiErr::from_db(what))?
        .ok_or_else(|| ApiErr::not_found(format!("{what} not found")))
}

/// Run a scoped delete; zero affected rows is 404.
fn delete_owned(conn: &Connection, built: Built, what: &str) -> Result<(), ApiErr> {
    let deleted = sq_execute(conn, built).map_err(ApiErr::from_db(what))?;
    if deleted == 0 {
        return Err(ApiErr::not_found(format!("{what} not found")));
    }
    Ok(())
}

fn list_achievements_for(conn: &Connection, user_id: &str) -> Result<Vec<Achievement>, ApiErr> {
    sq_query_map(conn, db::achievements::list(user_id), achievement_from_row)
        .map_err(ApiErr::from_db("list achievements"))
}

/// Every row the dashboard and advisors read for one user.
fn load_snapshot(conn: &Connection, user_id: &str) -> Result<FinancialSnapshot, ApiErr> {
    Ok(FinancialSnapshot {
        profile: sq_query_opt(conn, db::profiles::get(user_id), profile_from_row)
            .map_err(ApiErr::from_db("load profile"))?,
        expenses: sq_query_map(
            conn,
            db::expenses::list(user_id, &ExpenseListQuery::default()),
            expense_from_row,
        )
        .map_err(ApiErr::from_db("list expenses"))?,
        goals: sq_query_map(conn, db::goals::list(user_id), goal_from_row)
            .map_err(ApiErr::from_db("list goals"))?,
        bills: sq_query_map(conn, db::bills::list(user_id, false), bill_from_row)
            .map_err(ApiErr::from_db("list bills"))?,
        assets: sq_query_map(conn, db::assets::list(user_id), asset_from_row)
            .map_err(ApiErr::from_db("list assets"))?,
        liabilities: sq_query_map(conn, db::liabilities::list(user_id), liability_from_row)
            .map_err(ApiErr::from_db("list liabilities"))?,
    })
}
