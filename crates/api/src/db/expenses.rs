//! Expense query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Expenses;
use crate::{Expense, ExpenseListQuery};

/// Column order expected by the expense row mapper.
pub const COLUMNS: [Expenses; 8] = [
    Expenses::Id,
    Expenses::UserId,
    Expenses::Category,
    Expenses::Amount,
    Expenses::Date,
    Expenses::Description,
    Expenses::CreatedAt,
    Expenses::UpdatedAt,
];

/// List a user's expenses, newest first.
pub fn list(user_id: &str, q: &ExpenseListQuery) -> Built {
    let mut select = Query::select()
        .columns(COLUMNS)
        .from(Expenses::Table)
        .and_where(Expr::col(Expenses::UserId).eq(user_id))
        .to_owned();
    if let Some(from) = q.from {
        select.and_where(Expr::col(Expenses::Date).gte(from.to_string()));
    }
    if let Some(to) = q.to {
        select.and_where(Expr::col(Expenses::Date).lte(to.to_string()));
    }
    if let Some(category) = q.category.as_deref().filter(|c| !c.is_empty()) {
        select.and_where(Expr::col(Expenses::Category).eq(category));
    }
    select
        .order_by(Expenses::Date, Order::Desc)
        .order_by(Expenses::CreatedAt, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn get(user_id: &str, id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Expenses::Table)
        .and_where(Expr::col(Expenses::Id).eq(id))
        .and_where(Expr::col(Expenses::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn insert(e: &Expense) -> Built {
    Query::insert()
        .into_table(Expenses::Table)
        .columns(COLUMNS)
        .values_panic([
            e.id.as_str().into(),
            e.user_id.as_str().into(),
            e.category.as_str().into(),
            e.amount.into(),
            e.date.to_string().into(),
            e.description.clone().into(),
            e.created_at.as_str().into(),
            e.updated_at.as_str().into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Overwrite the mutable columns of an expense owned by `e.user_id`.
pub fn update(e: &Expense) -> Built {
    Query::update()
        .table(Expenses::Table)
        .value(Expenses::Category, e.category.as_str())
        .value(Expenses::Amount, e.amount)
        .value(Expenses::Date, e.date.to_string())
        .value(Expenses::Description, e.description.clone())
        .value(Expenses::UpdatedAt, e.updated_at.as_str())
        .and_where(Expr::col(Expenses::Id).eq(e.id.as_str()))
        .and_where(Expr::col(Expenses::UserId).eq(e.user_id.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Expenses::Table)
        .and_where(Expr::col(Expenses::Id).eq(id))
        .and_where(Expr::col(Expenses::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn list_filters_are_scoped_to_user() {
        let q = ExpenseListQuery {
            from: NaiveDate::from_ymd_opt(2025, 6, 1),
            to: None,
            category: Some("Food".into()),
        };
        let (sql, values) = list("u1", &q);
        assert!(sql.contains(r#""user_id" = ?"#), "{sql}");
        assert!(sql.contains(r#""date" >= ?"#), "{sql}");
        assert!(sql.contains(r#""category" = ?"#), "{sql}");
        assert!(!sql.contains(r#""date" <= ?"#), "{sql}");
        assert_eq!(values.0.len(), 3);
    }

    #[test]
    fn writes_filter_by_id_and_user() {
        for (sql, _) in [delete("u1", "e1"), get("u1", "e1")] {
            assert!(sql.contains(r#""id" = ?"#), "{sql}");
            assert!(sql.contains(r#""user_id" = ?"#), "{sql}");
        }
    }
}
