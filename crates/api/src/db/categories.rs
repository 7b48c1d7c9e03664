//! Custom category query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Categories;
use crate::Category;

pub const COLUMNS: [Categories; 5] = [
    Categories::Id,
    Categories::UserId,
    Categories::Name,
    Categories::Icon,
    Categories::CreatedAt,
];

pub fn list(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Categories::Table)
        .and_where(Expr::col(Categories::UserId).eq(user_id))
        .order_by(Categories::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Categories::Table)
        .and_where(Expr::col(Categories::Id).eq(id))
        .and_where(Expr::col(Categories::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(c: &Category) -> Built {
    Query::insert()
        .into_table(Categories::Table)
        .columns(COLUMNS)
        .values_panic([
            c.id.as_str().into(),
            c.user_id.as_str().into(),
            c.name.as_str().into(),
            c.icon.as_str().into(),
            c.created_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update(c: &Category) -> Built {
    Query::update()
        .table(Categories::Table)
        .value(Categories::Name, c.name.as_str())
        .value(Categories::Icon, c.icon.as_str())
        .and_where(Expr::col(Categories::Id).eq(c.id.as_str()))
        .and_where(Expr::col(Categories::UserId).eq(c.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Categories::Table)
        .and_where(Expr::col(Categories::Id).eq(id))
        .and_where(Expr::col(Categories::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}
