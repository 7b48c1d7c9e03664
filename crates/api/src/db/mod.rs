//! Shared database schema, migrations, and query builders.
//!
//! Every builder that touches user data filters by `user_id`. Column order of
//! each `COLUMNS` list matches the positional row mappers in the server.

pub mod achievements;
pub mod assets;
pub mod bills;
pub mod categories;
pub mod changes;
pub mod expenses;
pub mod goals;
pub mod liabilities;
pub mod migrations;
pub mod profiles;
pub mod tables;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL text plus bound values.
pub type Built = (String, sea_query::Values);
