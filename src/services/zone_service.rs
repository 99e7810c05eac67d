//! Zone analytics service
//!
//! Two crossing definitions live behind this service on purpose. Status
//! rows compare the latest two raw ticks, which is what an intraday table
//! wants. Alert candidates compare the latest two daily closes, so one
//! crossing alerts once per day instead of once per tick. The two can
//! disagree when consecutive ticks straddle a date boundary.

use crate::db::models::{AlertCandidate, PricePoint, ZoneStatus, ZoneStatusRow};
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Headline counts over a status row set.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummary {
    pub tracked: usize,
    pub in_zone: usize,
    pub crossed_today: usize,
}

/// Service for zone membership, crossing signals, and price history
pub struct ZoneService;

impl ZoneService {
    /// One status row per watched instrument, ordered by ticker.
    ///
    /// The view is re-pointed at the lake first, so rows always reflect the
    /// partitions on disk. An empty lake degrades to `No data` rows rather
    /// than failing.
    pub fn status_rows(state: &AppState) -> Result<Vec<ZoneStatusRow>> {
        info!("ZoneService::status_rows");

        let partition_files = state.db.rebuild_price_view(&state.lake)?;
        if partition_files == 0 {
            return state.db.watchlist_status_rows();
        }
        state.db.zone_status_rows()
    }

    /// Instruments whose latest two daily closes crossed into the zone,
    /// restricted to `notify_on_cross` rows.
    pub fn alert_candidates(state: &AppState) -> Result<Vec<AlertCandidate>> {
        info!("ZoneService::alert_candidates");

        let partition_files = state.db.rebuild_price_view(&state.lake)?;
        if partition_files == 0 {
            return Ok(Vec::new());
        }
        state.db.alert_candidates()
    }

    /// Close series for one instrument over a trailing window, oldest first.
    pub fn price_history(
        state: &AppState,
        ticker: &str,
        window_days: u32,
    ) -> Result<Vec<PricePoint>> {
        info!("ZoneService::price_history - {} over {} days", ticker, window_days);

        let partition_files = state.db.rebuild_price_view(&state.lake)?;
        if partition_files == 0 {
            return Ok(Vec::new());
        }
        state.db.price_history(ticker, window_days)
    }

    /// Counts for a one-line summary of a status table.
    pub fn summary(rows: &[ZoneStatusRow]) -> ZoneSummary {
        ZoneSummary {
            tracked: rows.len(),
            in_zone: rows
                .iter()
                .filter(|r| r.zone_status == ZoneStatus::InZone)
                .count(),
            crossed_today: rows.iter().filter(|r| r.crossed_today).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ObservationField, PriceObservation, WatchItem};
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn watch(state: &AppState, ticker: &str, low: f64, high: f64) {
        let mut items = state.db.watch_items().unwrap();
        items.push(WatchItem {
            ticker: ticker.to_string(),
            currency: "USD".to_string(),
            zone_low: low,
            zone_high: high,
            notify_on_cross: true,
            cooloff_days: 1,
            tags: Vec::new(),
            notes: String::new(),
        });
        state.db.replace_watchlist(&items).unwrap();
    }

    fn write_close(state: &AppState, ticker: &str, hours_ago: i64, value: f64) {
        let obs = PriceObservation::new(
            ticker,
            Utc::now() - Duration::hours(hours_ago),
            ObservationField::Close,
            value,
        );
        state.db.write_observations(&state.lake, &[obs]).unwrap();
    }

    #[test]
    fn test_status_rows_over_empty_lake_fall_back() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        watch(&state, "AAPL", 100.0, 110.0);

        let rows = ZoneService::status_rows(&state).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].zone_status, ZoneStatus::NoData);
    }

    #[test]
    fn test_status_rows_pick_up_new_partitions() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        watch(&state, "AAPL", 100.0, 110.0);

        // Separate days, so the second write adds a partition instead of
        // replacing the first one.
        write_close(&state, "AAPL", 26, 95.0);
        write_close(&state, "AAPL", 1, 105.0);

        let rows = ZoneService::status_rows(&state).unwrap();
        assert_eq!(rows[0].close_prev, Some(95.0));
        assert_eq!(rows[0].zone_status, ZoneStatus::InZone);
        assert!(rows[0].crossed_today);
    }

    #[test]
    fn test_alerts_over_empty_lake_are_empty() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        watch(&state, "AAPL", 100.0, 110.0);

        assert!(ZoneService::alert_candidates(&state).unwrap().is_empty());
    }

    #[test]
    fn test_price_history_over_empty_lake_is_empty() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        watch(&state, "AAPL", 100.0, 110.0);

        assert!(ZoneService::price_history(&state, "AAPL", 30)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        watch(&state, "AAPL", 100.0, 110.0);
        watch(&state, "MSFT", 395.0, 410.0);
        watch(&state, "NVDA", 500.0, 520.0);

        write_close(&state, "AAPL", 26, 95.0);
        write_close(&state, "AAPL", 1, 105.0);
        write_close(&state, "MSFT", 1, 300.0);

        let rows = ZoneService::status_rows(&state).unwrap();
        let summary = ZoneService::summary(&rows);
        assert_eq!(summary.tracked, 3);
        assert_eq!(summary.in_zone, 1);
        assert_eq!(summary.crossed_today, 1);
    }
}
