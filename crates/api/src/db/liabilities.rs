//! Liability query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Liabilities;
use crate::Liability;

pub const COLUMNS: [Liabilities; 10] = [
    Liabilities::Id,
    Liabilities::UserId,
    Liabilities::Name,
    Liabilities::LiabilityType,
    Liabilities::PrincipalAmount,
    Liabilities::OutstandingAmount,
    Liabilities::InterestRate,
    Liabilities::EmiAmount,
    Liabilities::CreatedAt,
    Liabilities::UpdatedAt,
];

pub fn list(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Liabilities::Table)
        .and_where(Expr::col(Liabilities::UserId).eq(user_id))
        .order_by(Liabilities::InterestRate, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Liabilities::Table)
        .and_where(Expr::col(Liabilities::Id).eq(id))
        .and_where(Expr::col(Liabilities::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(l: &Liability) -> Built {
    Query::insert()
        .into_table(Liabilities::Table)
        .columns(COLUMNS)
        .values_panic([
            l.id.as_str().into(),
            l.user_id.as_str().into(),
            l.name.as_str().into(),
            l.liability_type.as_str().into(),
            l.principal_amount.into(),
            l.outstanding_amount.into(),
            l.interest_rate.into(),
            l.emi_amount.into(),
            l.created_at.as_str().into(),
            l.updated_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update(l: &Liability) -> Built {
    Query::update()
        .table(Liabilities::Table)
        .value(Liabilities::Name, l.name.as_str())
        .value(Liabilities::LiabilityType, l.liability_type.as_str())
        .value(Liabilities::PrincipalAmount, l.principal_amount)
        .value(Liabilities::OutstandingAmount, l.outstanding_amount)
        .value(Liabilities::InterestRate, l.interest_rate)
        .value(Liabilities::EmiAmount, l.emi_amount)
        .value(Liabilities::UpdatedAt, l.updated_at.as_str())
        .and_where(Expr::col(Liabilities::Id).eq(l.id.as_str()))
        .and_where(Expr::col(Liabilities::UserId).eq(l.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Liabilities::Table)
        .and_where(Expr::col(Liabilities::Id).eq(id))
        .and_where(Expr::col(Liabilities::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}
