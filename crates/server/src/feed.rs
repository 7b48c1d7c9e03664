//! Change notifications: every write appends to `change_log` and wakes
//! long-polling readers of `/api/changes`.

use finquest_api::{ChangeOp, ChangeRecord, Table, db};
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::storage::{sq_execute, sq_query_map};

const CHANNEL_CAPACITY: usize = 256;

/// Wake-up channel carrying the id of the user whose rows changed.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<String>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Wake waiters for `user_id`. Nobody listening is not an error.
    pub fn notify(&self, user_id: &str) {
        let _ = self.tx.send(user_id.to_string());
    }
}

/// Append one change row. Call with the same connection guard as the write.
pub fn record(
    conn: &Connection,
    user_id: &str,
    table: Table,
    row_id: &str,
    op: ChangeOp,
) -> rusqlite::Result<()> {
    let now = finquest_api::service::now_timestamp();
    sq_execute(conn, db::changes::insert(user_id, table, row_id, op, &now))?;
    Ok(())
}

/// One read of the change log.
#[derive(Debug, Default)]
pub struct ChangePage {
    pub changes: Vec<ChangeRecord>,
    /// Highest `seq` read, including rows that could not be decoded.
    pub last_seq: Option<i64>,
}

impl ChangePage {
    /// Nothing was read at all.
    pub fn is_empty(&self) -> bool {
        self.last_seq.is_none()
    }

    /// Cursor to resume from: past every row read, so an undecodable page
    /// still moves the reader forward.
    pub fn next_cursor(&self, since: i64) -> i64 {
        self.last_seq.map_or(since, |seq| seq.max(since))
    }
}

/// A user's changes after `since`, oldest first.
pub fn load_since(
    conn: &Connection,
    user_id: &str,
    since: i64,
    limit: u64,
) -> rusqlite::Result<ChangePage> {
    let rows = sq_query_map(conn, db::changes::since(user_id, since, limit), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;
    let last_seq = rows.iter().map(|(seq, ..)| *seq).max();
    let changes = rows
        .into_iter()
        .filter_map(|(seq, table, row_id, op, created_at)| {
            let table = Table::parse(&table);
            let op = ChangeOp::parse(&op);
            if table.is_none() || op.is_none() {
                tracing::warn!(seq, "skipping unreadable change_log row");
            }
            Some(ChangeRecord {
                seq,
                table: table?,
                row_id,
                op: op?,
                created_at,
            })
        })
        .collect();
    Ok(ChangePage { changes, last_seq })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_db;

    #[test]
    fn changes_are_scoped_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        let conn = db.conn();
        record(&conn, "alice", Table::Expenses, "e1", ChangeOp::Insert).unwrap();
        record(&conn, "bob", Table::Goals, "g1", ChangeOp::Insert).unwrap();
        record(&conn, "alice", Table::Expenses, "e1", ChangeOp::Delete).unwrap();

        let all = load_since(&conn, "alice", 0, 200).unwrap().changes;
        assert_eq!(all.len(), 2);
        assert!(all[0].seq < all[1].seq);
        assert_eq!(all[1].op, ChangeOp::Delete);

        let after = load_since(&conn, "alice", all[0].seq, 200).unwrap().changes;
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].row_id, "e1");

        let bob = load_since(&conn, "bob", 0, 200).unwrap().changes;
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].table, Table::Goals);
    }

    #[test]
    fn unreadable_rows_still_advance_the_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        let conn = db.conn();
        conn.execute(
            "INSERT INTO change_log (user_id, table_name, row_id, op, created_at) \
             VALUES ('alice', 'budgets', 'b1', 'insert', '2025-06-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let page = load_since(&conn, "alice", 0, 200).unwrap();
        assert!(page.changes.is_empty());
        assert!(!page.is_empty());
        let cursor = page.next_cursor(0);
        assert!(cursor > 0);

        let page = load_since(&conn, "alice", cursor, 200).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_cursor(cursor), cursor);
    }

    #[tokio::test]
    async fn notify_wakes_subscribers() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();
        feed.notify("alice");
        assert_eq!(rx.recv().await.unwrap(), "alice");
    }
}
