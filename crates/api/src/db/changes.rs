//! Change feed query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::ChangeLog;
use crate::{ChangeOp, Table};

pub const COLUMNS: [ChangeLog; 5] = [
    ChangeLog::Seq,
    ChangeLog::TableName,
    ChangeLog::RowId,
    ChangeLog::Op,
    ChangeLog::CreatedAt,
];

pub fn insert(user_id: &str, table: Table, row_id: &str, op: ChangeOp, created_at: &str) -> Built {
    Query::insert()
        .into_table(ChangeLog::Table)
        .columns([
            ChangeLog::UserId,
            ChangeLog::TableName,
            ChangeLog::RowId,
            ChangeLog::Op,
            ChangeLog::CreatedAt,
        ])
        .values_panic([
            user_id.into(),
            table.as_str().into(),
            row_id.into(),
            op.as_str().into(),
            created_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// A user's changes after `since`, oldest first.
pub fn since(user_id: &str, since: i64, limit: u64) -> Built {
    Query::select()
        .columns(COLUMNS)
        .from(ChangeLog::Table)
        .and_where(Expr::col(ChangeLog::UserId).eq(user_id))
        .and_where(Expr::col(ChangeLog::Seq).gt(since))
        .order_by(ChangeLog::Seq, Order::Asc)
        .limit(limit)
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_is_scoped_and_limited() {
        let (sql, values) = since("u1", 42, 200);
        assert!(sql.contains(r#""user_id" = ?"#), "{sql}");
        assert!(sql.contains(r#""seq" > ?"#), "{sql}");
        assert!(sql.contains("LIMIT"), "{sql}");
        assert!(sql.contains(r#"ORDER BY "seq" ASC"#), "{sql}");
        assert!(values.0.len() >= 2);
    }
}
