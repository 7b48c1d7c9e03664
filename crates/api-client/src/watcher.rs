//! Keeps [`Caches`] fresh by long-polling `/api/changes`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use finquest_api::{ChangeRecord, ChangesQuery, Table};
use tokio::task::JoinHandle;

use crate::cache::Caches;
use crate::client::ApiClient;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Follows the change feed from a cursor and refreshes the caches of every
/// table a batch touches.
pub struct ChangeWatcher {
    client: Arc<ApiClient>,
    caches: Caches,
    cursor: i64,
    wait_secs: u64,
}

impl ChangeWatcher {
    /// `wait_secs` is the long-poll window; the client's timeout must exceed it.
    pub fn new(client: Arc<ApiClient>, caches: Caches, wait_secs: u64) -> Self {
        Self {
            client,
            caches,
            cursor: 0,
            wait_secs,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Skip past existing history, then load every cache.
    ///
    /// The cursor is taken before the fetch, so a write racing the initial
    /// load still shows up on the next poll.
    pub async fn prime(&mut self) -> Result<()> {
        loop {
            let page = self.fetch(0).await?;
            if page.is_empty() {
                break;
            }
        }
        self.caches.refresh_all(&self.client).await
    }

    /// Wait for one batch and refresh what it touched. Returns those tables.
    pub async fn poll_once(&mut self) -> Result<Vec<Table>> {
        let changes = self.fetch(self.wait_secs).await?;
        let tables = tables_touched(&changes);
        for table in &tables {
            self.caches.refresh(&self.client, *table).await?;
        }
        Ok(tables)
    }

    async fn fetch(&mut self, wait: u64) -> Result<Vec<ChangeRecord>> {
        let resp = self
            .client
            .changes(&ChangesQuery {
                since: Some(self.cursor),
                wait: Some(wait),
            })
            .await?;
        self.cursor = resp.next_cursor;
        Ok(resp.changes)
    }

    /// Prime, then poll until the handle is dropped. Errors back off and retry.
    pub fn spawn(mut self) -> WatchHandle {
        let task = tokio::spawn(async move {
            let mut backoff = Duration::from_secs(1);
            while let Err(e) = self.prime().await {
                tracing::warn!("initial cache load failed: {e:#}");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            backoff = Duration::from_secs(1);
            loop {
                match self.poll_once().await {
                    Ok(tables) => {
                        backoff = Duration::from_secs(1);
                        if !tables.is_empty() {
                            tracing::debug!(?tables, cursor = self.cursor, "caches updated");
                        }
                    }
                    Err(e) => {
                        tracing::warn!("change feed poll failed: {e:#}");
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        });
        WatchHandle { task }
    }
}

/// Stops the watcher when dropped.
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Distinct cached tables in a batch, in first-seen order.
pub fn tables_touched(changes: &[ChangeRecord]) -> Vec<Table> {
    let mut tables = Vec::new();
    for change in changes {
        if Caches::is_cached(change.table) && !tables.contains(&change.table) {
            tables.push(change.table);
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use finquest_api::ChangeOp;

    fn change(seq: i64, table: Table) -> ChangeRecord {
        ChangeRecord {
            seq,
            table,
            row_id: format!("row-{seq}"),
            op: ChangeOp::Insert,
            created_at: "2025-06-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn touched_tables_are_distinct_and_cached() {
        let batch = vec![
            change(1, Table::Expenses),
            change(2, Table::Achievements),
            change(3, Table::Expenses),
            change(4, Table::Bills),
        ];
        assert_eq!(tables_touched(&batch), vec![Table::Expenses, Table::Bills]);
        assert!(tables_touched(&[]).is_empty());
    }
}
