//! Pocket storage crate - SQLite persistence for tasks, transactions and
//! todos.
//!
//! Provides the record store with migrations, a typed repository per
//! entity, and the in-memory aggregations used by the statistics views.

pub mod aggregate;
pub mod db;
pub mod migrations;
pub mod repository;
pub mod update;

pub use aggregate::{
    completion_stats, group_by_month, monthly_series, summarize, CompletionStats, MonthSeries,
    MonthlyTotal, Summary,
};
pub use db::{Database, Execution, Row};
pub use repository::{row_to_record, RecordRepository, Visibility};
pub use update::UpdateBuilder;
