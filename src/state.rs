//! Application state management

use crate::db::MarketDb;
use crate::error::Result;
use crate::lake::PriceLake;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Database file name inside the data directory.
const DB_FILE: &str = "markets.duckdb";
/// Watchlist configuration file name inside the data directory.
const WATCHLIST_FILE: &str = "watchlist.json";
/// Price lake directory name inside the data directory.
const LAKE_DIR: &str = "prices";

/// Application state shared by every job in one process
pub struct AppState {
    /// DuckDB handle for the watchlist and price views
    pub db: Arc<MarketDb>,

    /// Price lake location on disk
    pub lake: PriceLake,

    /// Declarative watchlist document
    pub watchlist_path: PathBuf,

    /// Application data directory
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the data directory layout, creating it on first run.
    ///
    /// ```text
    /// <data_dir>/markets.duckdb    watchlist table, views
    /// <data_dir>/prices/           hive-partitioned parquet lake
    /// <data_dir>/watchlist.json    declarative watchlist
    /// ```
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        tracing::info!("Data directory: {}", data_dir.display());

        let db = Arc::new(MarketDb::open(&data_dir.join(DB_FILE))?);
        let lake = PriceLake::new(data_dir.join(LAKE_DIR));

        Ok(Self {
            db,
            lake,
            watchlist_path: data_dir.join(WATCHLIST_FILE),
            data_dir: data_dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("data");

        let state = AppState::open(&root).unwrap();
        assert!(root.join(DB_FILE).exists());
        assert_eq!(state.lake.root(), root.join(LAKE_DIR).as_path());
        assert_eq!(state.watchlist_path, root.join(WATCHLIST_FILE));

        // The lake directory itself appears lazily, on first write.
        assert!(!state.lake.root().exists());
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempdir().unwrap();

        {
            let state = AppState::open(dir.path()).unwrap();
            state
                .db
                .replace_watchlist(&[crate::db::models::WatchItem {
                    ticker: "AAPL".to_string(),
                    currency: "USD".to_string(),
                    zone_low: 100.0,
                    zone_high: 110.0,
                    notify_on_cross: true,
                    cooloff_days: 1,
                    tags: Vec::new(),
                    notes: String::new(),
                }])
                .unwrap();
        }

        let state = AppState::open(dir.path()).unwrap();
        assert_eq!(state.db.tickers().unwrap(), vec!["AAPL"]);
    }
}
