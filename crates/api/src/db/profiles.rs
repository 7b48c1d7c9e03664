//! Profile query builders. One row per user, keyed by `user_id`.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Profiles;
use crate::Profile;

pub const COLUMNS: [Profiles; 5] = [
    Profiles::UserId,
    Profiles::AnnualSalary,
    Profiles::DisplayName,
    Profiles::CreatedAt,
    Profiles::UpdatedAt,
];

pub fn get(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Profiles::Table)
        .and_where(Expr::col(Profiles::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Insert a profile unless the user already has one.
pub fn insert_if_missing(p: &Profile) -> Built {
    Query::insert()
        .into_table(Profiles::Table)
        .columns(COLUMNS)
        .values_panic([
            p.user_id.as_str().into(),
            p.annual_salary.into(),
            p.display_name.clone().into(),
            p.created_at.as_str().into(),
            p.updated_at.as_str().into(),
        ])
        .on_conflict(OnConflict::column(Profiles::UserId).do_nothing().to_owned())
        .build(SqliteQueryBuilder)
}

pub fn update(p: &Profile) -> Built {
    Query::update()
        .table(Profiles::Table)
        .value(Profiles::AnnualSalary, p.annual_salary)
        .value(Profiles::DisplayName, p.display_name.clone())
        .value(Profiles::UpdatedAt, p.updated_at.as_str())
        .and_where(Expr::col(Profiles::UserId).eq(p.user_id.as_str()))
        .build(SqliteQueryBuilder)
}
