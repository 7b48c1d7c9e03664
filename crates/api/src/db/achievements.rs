//! Achievement award query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Achievements;
use crate::Achievement;

pub const COLUMNS: [Achievements; 5] = [
    Achievements::Id,
    Achievements::UserId,
    Achievements::AchievementType,
    Achievements::Points,
    Achievements::EarnedAt,
];

pub fn list(user_id: &str) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(Achievements::Table)
        .and_where(Expr::col(Achievements::UserId).eq(user_id))
        .order_by(Achievements::EarnedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Record an award. A second award of the same type for the same user is a no-op,
/// so the affected row count tells whether this call actually awarded it.
pub fn insert_or_ignore(a: &Achievement) -> Built {
    Query::insert()
        .into_table(Achievements::Table)
        .columns(COLUMNS)
        .values_panic([
            a.id.as_str().into(),
            a.user_id.as_str().into(),
            a.achievement_type.as_str().into(),
            a.points.into(),
            a.earned_at.as_str().into(),
        ])
        .on_conflict(
            OnConflict::columns([Achievements::UserId, Achievements::AchievementType])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_awards_do_nothing() {
        let award = Achievement {
            id: "a1".into(),
            user_id: "u1".into(),
            achievement_type: "first_expense".into(),
            points: 10,
            earned_at: "2025-01-01T00:00:00Z".into(),
        };
        let (sql, values) = insert_or_ignore(&award);
        assert!(sql.contains("ON CONFLICT"), "{sql}");
        assert!(sql.contains("DO NOTHING"), "{sql}");
        assert_eq!(values.0.len(), 5);
    }
}
