//! Bill query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Bills;
use crate::Bill;

pub const COLUMNS: [Bills; 11] = [
    Bills::Id,
    Bills::UserId,
    Bills::Title,
    Bills::Amount,
    Bills::Frequency,
    Bills::DueDate,
    Bills::IsPaid,
    Bills::Category,
    Bills::PaidAt,
    Bills::CreatedAt,
    Bills::UpdatedAt,
];

/// List a user's bills by due date; `unpaid_only` drops paid ones.
pub fn list(user_id: &str, unpaid_only: bool) -> Built {
    let mut select = Query::select()
        .columns(COLUMNS)
        .from(Bills::Table)
        .and_where(Expr::col(Bills::UserId).eq(user_id))
        .to_owned();
    if unpaid_only {
        select.and_where(Expr::col(Bills::IsPaid).eq(false));
    }
    select
        .order_by(Bills::DueDate, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Bills::Table)
        .and_where(Expr::col(Bills::Id).eq(id))
        .and_where(Expr::col(Bills::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(b: &Bill) -> Built {
    Query::insert()
        .into_table(Bills::Table)
        .columns(COLUMNS)
        .values_panic([
            b.id.as_str().into(),
            b.user_id.as_str().into(),
            b.title.as_str().into(),
            b.amount.into(),
            b.frequency.as_str().into(),
            b.due_date.to_string().into(),
            b.is_paid.into(),
            b.category.clone().into(),
            b.paid_at.clone().into(),
            b.created_at.as_str().into(),
            b.updated_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update(b: &Bill) -> Built {
    Query::update()
        .table(Bills::Table)
        .value(Bills::Title, b.title.as_str())
        .value(Bills::Amount, b.amount)
        .value(Bills::Frequency, b.frequency.as_str())
        .value(Bills::DueDate, b.due_date.to_string())
        .value(Bills::IsPaid, b.is_paid)
        .value(Bills::Category, b.category.clone())
        .value(Bills::PaidAt, b.paid_at.clone())
        .value(Bills::UpdatedAt, b.updated_at.as_str())
        .and_where(Expr::col(Bills::Id).eq(b.id.as_str()))
        .and_where(Expr::col(Bills::UserId).eq(b.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Bills::Table)
        .and_where(Expr::col(Bills::Id).eq(id))
        .and_where(Expr::col(Bills::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaid_filter_is_optional() {
        let (all, _) = list("u1", false);
        let (unpaid, _) = list("u1", true);
        assert!(!all.contains(r#""is_paid" = "#), "{all}");
        assert!(all.contains(r#""is_paid""#), "{all}");
        assert!(unpaid.contains(r#""is_paid" = "#), "{unpaid}");
        assert!(unpaid.contains("ORDER BY"), "{unpaid}");
    }
}
