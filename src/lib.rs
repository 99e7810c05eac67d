//! Zonewatch - Watchlist Zone Tracking
//!
//! Tracks a declared watchlist of instruments against per-instrument buy
//! zones. Price observations land in a hive-partitioned parquet lake and
//! are read through a DuckDB view that unifies the partitions. Zone
//! analytics reduce each instrument to its latest two closes and classify
//! it as in zone, below, above, or no data, with a crossed-into-zone
//! signal for alerting.

pub mod config;
pub mod db;
pub mod error;
pub mod lake;
pub mod provider;
pub mod services;
pub mod state;
