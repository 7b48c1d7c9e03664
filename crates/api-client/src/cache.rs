//! Per-entity caches of the signed-in user's rows.
//!
//! A cache never merges: a refresh fetches the whole table and replaces the
//! local copy, so the last fetch observed wins.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use finquest_api::{
    Asset, Bill, BillListQuery, Category, Expense, ExpenseListQuery, Goal, Liability, Profile,
    Table,
};

use crate::client::ApiClient;

/// Shared, cloneable view of one table. Clones see the same rows.
#[derive(Debug)]
pub struct EntityCache<T> {
    table: Table,
    rows: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T: Clone> EntityCache<T> {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.rows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, rows: Vec<T>) {
        *self
            .rows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = rows;
    }

    pub fn len(&self) -> usize {
        self.rows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cache per user-editable table.
#[derive(Debug, Clone)]
pub struct Caches {
    pub expenses: EntityCache<Expense>,
    pub goals: EntityCache<Goal>,
    pub bills: EntityCache<Bill>,
    pub assets: EntityCache<Asset>,
    pub liabilities: EntityCache<Liability>,
    /// Custom categories only; built-ins are static.
    pub categories: EntityCache<Category>,
    pub profile: EntityCache<Profile>,
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}

impl Caches {
    /// Tables with a cache. Achievements are read on demand.
    pub const TABLES: [Table; 7] = [
        Table::Expenses,
        Table::Goals,
        Table::Bills,
        Table::Assets,
        Table::Liabilities,
        Table::Categories,
        Table::Profiles,
    ];

    pub fn new() -> Self {
        Self {
            expenses: EntityCache::new(Table::Expenses),
            goals: EntityCache::new(Table::Goals),
            bills: EntityCache::new(Table::Bills),
            assets: EntityCache::new(Table::Assets),
            liabilities: EntityCache::new(Table::Liabilities),
            categories: EntityCache::new(Table::Categories),
            profile: EntityCache::new(Table::Profiles),
        }
    }

    pub fn is_cached(table: Table) -> bool {
        Self::TABLES.contains(&table)
    }

    /// Re-fetch one table and replace its cache. Uncached tables are a no-op.
    pub async fn refresh(&self, client: &ApiClient, table: Table) -> Result<()> {
        match table {
            Table::Expenses => self
                .expenses
                .replace(client.list_expenses(&ExpenseListQuery::default()).await?),
            Table::Goals => self.goals.replace(client.list_goals().await?),
            Table::Bills => self
                .bills
                .replace(client.list_bills(&BillListQuery::default()).await?),
            Table::Assets => self.assets.replace(client.list_assets().await?),
            Table::Liabilities => self.liabilities.replace(client.list_liabilities().await?),
            Table::Categories => self
                .categories
                .replace(client.list_categories().await?.custom),
            Table::Profiles => self.profile.replace(vec![client.profile().await?]),
            Table::Achievements => return Ok(()),
        }
        tracing::debug!(%table, "cache refreshed");
        Ok(())
    }

    pub async fn refresh_all(&self, client: &ApiClient) -> Result<()> {
        for table in Self::TABLES {
            self.refresh(client, table).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_rows_and_replace_wins() {
        let cache: EntityCache<String> = EntityCache::new(Table::Goals);
        let view = cache.clone();
        assert!(view.is_empty());

        cache.replace(vec!["a".into(), "b".into()]);
        assert_eq!(view.snapshot(), vec!["a", "b"]);

        view.replace(vec!["c".into()]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.snapshot(), vec!["c"]);
        assert_eq!(cache.table(), Table::Goals);
    }

    #[test]
    fn every_cache_is_keyed_by_its_table() {
        let caches = Caches::new();
        assert_eq!(caches.expenses.table(), Table::Expenses);
        assert_eq!(caches.profile.table(), Table::Profiles);
        assert!(Caches::is_cached(Table::Categories));
        assert!(!Caches::is_cached(Table::Achievements));
    }
}
