use anyhow::{Context, Result};
use chrono::NaiveDate;
use finquest_api::db::Built;
use finquest_api::db::migrations::MIGRATIONS;
use finquest_api::{
    Achievement, Asset, Bill, BillFrequency, Category, Expense, Goal, Liability, Profile,
};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join("finquest.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// sea-query bridge
// ---------------------------------------------------------------------------

fn to_sqlite_values(values: &sea_query::Values) -> Vec<Value> {
    values
        .0
        .iter()
        .map(|v| match v {
            sea_query::Value::Bool(Some(b)) => Value::Integer(i64::from(*b)),
            sea_query::Value::TinyInt(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::SmallInt(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::Int(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::BigInt(Some(i)) => Value::Integer(*i),
            sea_query::Value::TinyUnsigned(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::SmallUnsigned(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::Unsigned(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::BigUnsigned(Some(i)) => Value::Integer(*i as i64),
            sea_query::Value::Float(Some(f)) => Value::Real(f64::from(*f)),
            sea_query::Value::Double(Some(f)) => Value::Real(*f),
            sea_query::Value::String(Some(s)) => Value::Text(s.as_ref().clone()),
            sea_query::Value::Char(Some(c)) => Value::Text(c.to_string()),
            sea_query::Value::Bytes(Some(b)) => Value::Blob(b.as_ref().clone()),
            _ => Value::Null,
        })
        .collect()
}

/// Execute a built statement, returning the affected row count.
pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, rusqlite::params_from_iter(to_sqlite_values(&values)))
}

/// Run a built query and map every row.
pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(to_sqlite_values(&values)), f)?;
    rows.collect()
}

/// Run a built query expected to return one row.
pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, rusqlite::params_from_iter(to_sqlite_values(&values)), f)
}

/// Like [`sq_query_row`], with "no rows" mapped to `None`.
pub fn sq_query_opt<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    match sq_query_row(conn, built, f) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// True when `err` is a UNIQUE/CHECK constraint failure.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// Row mappers (column order follows each builder's `COLUMNS`)
// ---------------------------------------------------------------------------

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| conversion_error(idx, format!("invalid date {raw:?}: {e}")))
}

fn opt_date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        raw.parse()
            .map_err(|e| conversion_error(idx, format!("invalid date {raw:?}: {e}")))
    })
    .transpose()
}

pub fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        date: date_at(row, 4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        target_date: opt_date_at(row, 5)?,
        completed_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    let frequency: String = row.get(4)?;
    Ok(Bill {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        amount: row.get(3)?,
        frequency: BillFrequency::parse(&frequency)
            .ok_or_else(|| conversion_error(4, format!("unknown frequency {frequency:?}")))?,
        due_date: date_at(row, 5)?,
        is_paid: row.get(6)?,
        category: row.get(7)?,
        paid_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        asset_type: row.get(3)?,
        purchase_value: row.get(4)?,
        current_value: row.get(5)?,
        depreciation_rate: row.get(6)?,
        purchase_date: opt_date_at(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn liability_from_row(row: &Row<'_>) -> rusqlite::Result<Liability> {
    Ok(Liability {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        liability_type: row.get(3)?,
        principal_amount: row.get(4)?,
        outstanding_amount: row.get(5)?,
        interest_rate: row.get(6)?,
        emi_amount: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        annual_salary: row.get(1)?,
        display_name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub fn achievement_from_row(row: &Row<'_>) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        user_id: row.get(1)?,
        achievement_type: row.get(2)?,
        points: row.get(3)?,
        earned_at: row.get(4)?,
    })
}
