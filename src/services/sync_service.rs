//! Watchlist sync service

use crate::config;
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    /// Items declared in the configuration file, duplicates included.
    pub declared: usize,
    /// Rows persisted after duplicate merge.
    pub persisted: usize,
}

/// Service for reconciling the persisted watchlist with configuration
pub struct SyncService;

impl SyncService {
    /// Make the persisted watchlist exactly mirror the declared one.
    ///
    /// A missing or invalid configuration file fails the run before any
    /// write, so the persisted table is never half-updated.
    pub fn run(state: &AppState) -> Result<SyncResult> {
        info!(
            "SyncService::run - config: {}",
            state.watchlist_path.display()
        );

        let items = config::load_watch_items(&state.watchlist_path)?;
        let persisted = state.db.replace_watchlist(&items)?;

        Ok(SyncResult {
            declared: items.len(),
            persisted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sync_persists_declared_items() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        fs::write(
            &state.watchlist_path,
            r#"{ "watchlist": [
                { "ticker": "AAPL", "zone_low": 165, "zone_high": 175 },
                { "ticker": "AAPL", "zone_low": 165, "zone_high": 175 },
                { "ticker": "MSFT", "zone_low": 395, "zone_high": 410 }
            ] }"#,
        )
        .unwrap();

        let result = SyncService::run(&state).unwrap();
        assert_eq!(result.declared, 3);
        assert_eq!(result.persisted, 2);
        assert_eq!(state.db.tickers().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_sync_fails_without_config_and_leaves_table_alone() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();

        fs::write(
            &state.watchlist_path,
            r#"{ "watchlist": [ { "ticker": "AAPL", "zone_low": 1, "zone_high": 2 } ] }"#,
        )
        .unwrap();
        SyncService::run(&state).unwrap();

        fs::remove_file(&state.watchlist_path).unwrap();
        assert!(SyncService::run(&state).is_err());
        // The previous reconciliation result is untouched.
        assert_eq!(state.db.tickers().unwrap(), vec!["AAPL"]);
    }
}
