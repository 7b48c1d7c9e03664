//! Goal query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Goals;
use crate::Goal;

pub const COLUMNS: [Goals; 9] = [
    Goals::Id,
    Goals::UserId,
    Goals::Title,
    Goals::TargetAmount,
    Goals::CurrentAmount,
    Goals::TargetDate,
    Goals::CompletedAt,
    Goals::CreatedAt,
    Goals::UpdatedAt,
];

pub fn list(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Goals::Table)
        .and_where(Expr::col(Goals::UserId).eq(user_id))
        .order_by(Goals::CreatedAt, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Goals::Table)
        .and_where(Expr::col(Goals::Id).eq(id))
        .and_where(Expr::col(Goals::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(g: &Goal) -> Built {
    Query::insert()
        .into_table(Goals::Table)
        .columns(COLUMNS)
        .values_panic([
            g.id.as_str().into(),
            g.user_id.as_str().into(),
            g.title.as_str().into(),
            g.target_amount.into(),
            g.current_amount.into(),
            g.target_date.map(|d| d.to_string()).into(),
            g.completed_at.clone().into(),
            g.created_at.as_str().into(),
            g.updated_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update(g: &Goal) -> Built {
    Query::update()
        .table(Goals::Table)
        .value(Goals::Title, g.title.as_str())
        .value(Goals::TargetAmount, g.target_amount)
        .value(Goals::CurrentAmount, g.current_amount)
        .value(Goals::TargetDate, g.target_date.map(|d| d.to_string()))
        .value(Goals::CompletedAt, g.completed_at.clone())
        .value(Goals::UpdatedAt, g.updated_at.as_str())
        .and_where(Expr::col(Goals::Id).eq(g.id.as_str()))
        .and_where(Expr::col(Goals::UserId).eq(g.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Goals::Table)
        .and_where(Expr::col(Goals::Id).eq(id))
        .and_where(Expr::col(Goals::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}
