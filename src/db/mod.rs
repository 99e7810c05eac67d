//! DuckDB storage layer
//!
//! One database file holds the persisted `watchlist` table, the `v_prices`
//! view over the parquet lake, and the materialized `prices` table. All SQL
//! lives in the submodules; [`MarketDb`] is the handle services go through.

mod migrations;
pub mod models;
mod prices;
mod watchlist;
mod zone;

use crate::error::Result;
use crate::lake::PriceLake;
use duckdb::Connection;
use models::{AlertCandidate, PriceObservation, PricePoint, WatchItem, ZoneStatusRow};
use parking_lot::Mutex;
use std::path::Path;

/// Wrapper around the single DuckDB connection.
///
/// Jobs are batch and synchronous; the mutex serializes in-process access
/// and DuckDB's own file lock keeps out concurrent writer processes.
pub struct MarketDb {
    conn: Mutex<Connection>,
}

impl MarketDb {
    /// Open the database file, creating parent directories and running
    /// migrations as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!("Opening market database at {}", path.display());

        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Watchlist ==========

    /// Replace the persisted watchlist with the declared items; returns the
    /// row count after duplicate merge.
    pub fn replace_watchlist(&self, items: &[WatchItem]) -> Result<usize> {
        let mut conn = self.conn.lock();
        watchlist::replace_watchlist(&mut conn, items)
    }

    /// All persisted watch items, ordered by ticker.
    pub fn watch_items(&self) -> Result<Vec<WatchItem>> {
        let conn = self.conn.lock();
        watchlist::watch_items(&conn)
    }

    /// All persisted tickers, ordered.
    pub fn tickers(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        watchlist::tickers(&conn)
    }

    // ========== Price lake ==========

    /// Write observations into the lake as hive-partitioned parquet.
    pub fn write_observations(
        &self,
        lake: &PriceLake,
        rows: &[PriceObservation],
    ) -> Result<usize> {
        let mut conn = self.conn.lock();
        prices::write_observations(&mut conn, lake, rows)
    }

    /// Point `v_prices` at the current partition set; returns the partition
    /// file count.
    pub fn rebuild_price_view(&self, lake: &PriceLake) -> Result<usize> {
        let conn = self.conn.lock();
        prices::rebuild_price_view(&conn, lake)
    }

    /// Refresh the materialized `prices` table from `v_prices`; returns its
    /// row count.
    pub fn materialize_prices(&self) -> Result<usize> {
        let conn = self.conn.lock();
        prices::materialize_prices(&conn)
    }

    /// Close history for one instrument over a trailing window, oldest first.
    pub fn price_history(&self, ticker: &str, window_days: u32) -> Result<Vec<PricePoint>> {
        let conn = self.conn.lock();
        prices::price_history(&conn, ticker, window_days)
    }

    // ========== Zone analytics ==========

    /// One status row per watched instrument, from the latest two ticks.
    pub fn zone_status_rows(&self) -> Result<Vec<ZoneStatusRow>> {
        let conn = self.conn.lock();
        zone::zone_status_rows(&conn)
    }

    /// Status rows when the lake holds no observations at all.
    pub fn watchlist_status_rows(&self) -> Result<Vec<ZoneStatusRow>> {
        let conn = self.conn.lock();
        zone::watchlist_status_rows(&conn)
    }

    /// Daily-close crossing candidates for alert delivery.
    pub fn alert_candidates(&self) -> Result<Vec<AlertCandidate>> {
        let conn = self.conn.lock();
        zone::alert_candidates(&conn)
    }
}
