//! Client side of the FinQuest API: a typed HTTP client, per-table caches and
//! a change-feed watcher that keeps those caches fresh.

pub mod cache;
pub mod client;
pub mod watcher;

pub use cache::{Caches, EntityCache};
pub use client::ApiClient;
pub use finquest_api;
pub use watcher::{ChangeWatcher, WatchHandle};
