//! Asset query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Assets;
use crate::Asset;

pub const COLUMNS: [Assets; 10] = [
    Assets::Id,
    Assets::UserId,
    Assets::Name,
    Assets::AssetType,
    Assets::PurchaseValue,
    Assets::CurrentValue,
    Assets::DepreciationRate,
    Assets::PurchaseDate,
    Assets::CreatedAt,
    Assets::UpdatedAt,
];

pub fn list(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Assets::Table)
        .and_where(Expr::col(Assets::UserId).eq(user_id))
        .order_by(Assets::CurrentValue, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Assets::Table)
        .and_where(Expr::col(Assets::Id).eq(id))
        .and_where(Expr::col(Assets::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(a: &Asset) -> Built {
    Query::insert()
        .into_table(Assets::Table)
        .columns(COLUMNS)
        .values_panic([
            a.id.as_str().into(),
            a.user_id.as_str().into(),
            a.name.as_str().into(),
            a.asset_type.as_str().into(),
            a.purchase_value.into(),
            a.current_value.into(),
            a.depreciation_rate.into(),
            a.purchase_date.map(|d| d.to_string()).into(),
            a.created_at.as_str().into(),
            a.updated_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update(a: &Asset) -> Built {
    Query::update()
        .table(Assets::Table)
        .value(Assets::Name, a.name.as_str())
        .value(Assets::AssetType, a.asset_type.as_str())
        .value(Assets::PurchaseValue, a.purchase_value)
        .value(Assets::CurrentValue, a.current_value)
        .value(Assets::DepreciationRate, a.depreciation_rate)
        .value(Assets::PurchaseDate, a.purchase_date.map(|d| d.to_string()))
        .value(Assets::UpdatedAt, a.updated_at.as_str())
        .and_where(Expr::col(Assets::Id).eq(a.id.as_str()))
        .and_where(Expr::col(Assets::UserId).eq(a.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Assets::Table)
        .and_where(Expr::col(Assets::Id).eq(id))
        .and_where(Expr::col(Assets::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}
