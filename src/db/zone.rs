//! Zone analytics over the price view
//!
//! Ranks each instrument's Close observations newest-first, then joins the
//! top two against the watchlist. Status rows compare the latest two raw
//! ticks; alert candidates compare the latest two daily closes, where a
//! day's close is its most recent tick.

use crate::db::models::{
    date_from_str, split_tags, ts_from_micros, AlertCandidate, WatchItem, ZoneStatus,
    ZoneStatusRow,
};
use crate::error::{AppError, Result};
use duckdb::Connection;

const ZONE_STATUS_SQL: &str = "
WITH ranked AS (
    SELECT ticker,
           datetime,
           value AS close,
           LEAD(value) OVER (PARTITION BY ticker ORDER BY datetime DESC) AS close_prev,
           ROW_NUMBER() OVER (PARTITION BY ticker ORDER BY datetime DESC) AS rn
    FROM v_prices
    WHERE field = 'Close'
),
latest AS (
    SELECT * FROM ranked WHERE rn = 1
)
SELECT w.ticker,
       w.currency,
       w.zone_low,
       w.zone_high,
       w.notify_on_cross,
       w.cooloff_days,
       w.tags,
       w.notes,
       epoch_us(l.datetime) AS last_updated,
       l.close AS close_now,
       l.close_prev AS close_prev,
       CASE
           WHEN l.close_prev IS NULL OR l.close_prev = 0 THEN NULL
           ELSE (l.close - l.close_prev) / l.close_prev * 100
       END AS pct_change,
       CASE
           WHEN l.close BETWEEN w.zone_low AND w.zone_high THEN 'In zone'
           WHEN l.close < w.zone_low THEN 'Below'
           WHEN l.close > w.zone_high THEN 'Above'
           ELSE 'No data'
       END AS zone_status,
       CASE
           WHEN l.close BETWEEN w.zone_low AND w.zone_high
                AND (l.close_prev IS NULL
                     OR NOT (l.close_prev BETWEEN w.zone_low AND w.zone_high))
           THEN TRUE
           ELSE FALSE
       END AS crossed_today
FROM watchlist w
LEFT JOIN latest l ON l.ticker = w.ticker
ORDER BY w.ticker
";

const ALERT_CANDIDATES_SQL: &str = "
WITH daily AS (
    SELECT ticker,
           date,
           arg_max(value, datetime) AS close
    FROM v_prices
    WHERE field = 'Close'
    GROUP BY ticker, date
),
ranked AS (
    SELECT ticker,
           date,
           close,
           ROW_NUMBER() OVER (PARTITION BY ticker ORDER BY date DESC) AS rn
    FROM daily
)
SELECT a.ticker,
       CAST(a.date AS VARCHAR) AS date,
       a.close AS close_now,
       b.close AS close_prev,
       w.zone_low,
       w.zone_high
FROM ranked a
JOIN ranked b ON b.ticker = a.ticker AND b.rn = 2
JOIN watchlist w ON w.ticker = a.ticker
WHERE a.rn = 1
  AND w.notify_on_cross
  AND a.close BETWEEN w.zone_low AND w.zone_high
  AND NOT (b.close BETWEEN w.zone_low AND w.zone_high)
ORDER BY a.ticker
";

struct RawStatusRow {
    ticker: String,
    currency: String,
    zone_low: f64,
    zone_high: f64,
    notify_on_cross: bool,
    cooloff_days: i64,
    tags: String,
    notes: String,
    last_updated_us: Option<i64>,
    close_now: Option<f64>,
    close_prev: Option<f64>,
    pct_change: Option<f64>,
    zone_status: String,
    crossed_today: bool,
}

/// One status row per watched instrument, from the latest two Close ticks.
/// Instruments without observations come back with `No data` defaults.
pub fn zone_status_rows(conn: &Connection) -> Result<Vec<ZoneStatusRow>> {
    let mut stmt = conn.prepare(ZONE_STATUS_SQL)?;
    let raw = stmt
        .query_map([], |row| {
            Ok(RawStatusRow {
                ticker: row.get(0)?,
                currency: row.get(1)?,
                zone_low: row.get(2)?,
                zone_high: row.get(3)?,
                notify_on_cross: row.get(4)?,
                cooloff_days: row.get(5)?,
                tags: row.get(6)?,
                notes: row.get(7)?,
                last_updated_us: row.get(8)?,
                close_now: row.get(9)?,
                close_prev: row.get(10)?,
                pct_change: row.get(11)?,
                zone_status: row.get(12)?,
                crossed_today: row.get(13)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(raw.len());
    for r in raw {
        let last_updated = r.last_updated_us.map(ts_from_micros).transpose()?;
        let zone_status = ZoneStatus::parse(&r.zone_status)
            .ok_or_else(|| AppError::Internal(format!("unexpected zone status '{}'", r.zone_status)))?;
        rows.push(ZoneStatusRow {
            ticker: r.ticker,
            currency: r.currency,
            zone_low: r.zone_low,
            zone_high: r.zone_high,
            notify_on_cross: r.notify_on_cross,
            cooloff_days: r.cooloff_days as u32,
            tags: split_tags(&r.tags),
            notes: r.notes,
            last_updated,
            close_now: r.close_now,
            close_prev: r.close_prev,
            pct_change: r.pct_change,
            zone_status,
            crossed_today: r.crossed_today,
        });
    }
    Ok(rows)
}

/// Status rows for a lake with no observations at all: every watched
/// instrument as `No data`. Keeps the status surface usable before the
/// first ingestion.
pub fn watchlist_status_rows(conn: &Connection) -> Result<Vec<ZoneStatusRow>> {
    let items = super::watchlist::watch_items(conn)?;
    Ok(items.into_iter().map(no_data_row).collect())
}

fn no_data_row(item: WatchItem) -> ZoneStatusRow {
    ZoneStatusRow {
        ticker: item.ticker,
        currency: item.currency,
        zone_low: item.zone_low,
        zone_high: item.zone_high,
        notify_on_cross: item.notify_on_cross,
        cooloff_days: item.cooloff_days,
        tags: item.tags,
        notes: item.notes,
        last_updated: None,
        close_now: None,
        close_prev: None,
        pct_change: None,
        zone_status: ZoneStatus::NoData,
        crossed_today: false,
    }
}

/// Instruments whose latest daily close sits in the zone while the prior
/// daily close did not, restricted to `notify_on_cross` rows. Instruments
/// with fewer than two daily closes never qualify.
pub fn alert_candidates(conn: &Connection) -> Result<Vec<AlertCandidate>> {
    let mut stmt = conn.prepare(ALERT_CANDIDATES_SQL)?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut candidates = Vec::with_capacity(raw.len());
    for (ticker, date, close_now, close_prev, zone_low, zone_high) in raw {
        candidates.push(AlertCandidate {
            ticker,
            date: date_from_str(&date)?,
            close_now,
            close_prev,
            zone_low,
            zone_high,
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ObservationField, PriceObservation};
    use crate::db::{migrations, prices, watchlist};
    use crate::lake::PriceLake;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (Connection, PriceLake, TempDir) {
        let dir = tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        migrations::run_migrations(&conn).unwrap();
        let lake = PriceLake::new(dir.path().join("prices"));
        (conn, lake, dir)
    }

    fn watch(conn: &mut Connection, ticker: &str, low: f64, high: f64, notify: bool) {
        let item = WatchItem {
            ticker: ticker.to_string(),
            currency: "USD".to_string(),
            zone_low: low,
            zone_high: high,
            notify_on_cross: notify,
            cooloff_days: 1,
            tags: Vec::new(),
            notes: String::new(),
        };
        let mut existing = watchlist::watch_items(conn).unwrap();
        existing.push(item);
        watchlist::replace_watchlist(conn, &existing).unwrap();
    }

    /// (hours_ago, close) ticks for one ticker, written and re-viewed.
    fn write_closes(conn: &mut Connection, lake: &PriceLake, ticker: &str, ticks: &[(i64, f64)]) {
        let rows: Vec<PriceObservation> = ticks
            .iter()
            .map(|(hours_ago, value)| {
                let dt: DateTime<Utc> = Utc::now() - Duration::hours(*hours_ago);
                PriceObservation::new(ticker, dt, ObservationField::Close, *value)
            })
            .collect();
        prices::write_observations(conn, lake, &rows).unwrap();
        prices::rebuild_price_view(conn, lake).unwrap();
    }

    #[test]
    fn test_crossing_into_zone_flags_row() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);

        // One close per day so the later write lands in its own partition.
        // 90 then 95: still below the zone, no cross yet.
        write_closes(&mut conn, &lake, "AAPL", &[(50, 90.0), (26, 95.0)]);
        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows[0].zone_status, ZoneStatus::Below);
        assert!(!rows[0].crossed_today);

        // 105 lands inside the zone while the prior close was outside.
        write_closes(&mut conn, &lake, "AAPL", &[(1, 105.0)]);
        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.close_now, Some(105.0));
        assert_eq!(row.close_prev, Some(95.0));
        assert_eq!(row.zone_status, ZoneStatus::InZone);
        assert!(row.crossed_today);
        assert!(row.last_updated.is_some());

        let pct = row.pct_change.unwrap();
        assert!((pct - (105.0 - 95.0) / 95.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_already_in_zone_is_not_a_cross() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "AAPL", &[(2, 102.0), (1, 104.0)]);

        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows[0].zone_status, ZoneStatus::InZone);
        assert!(!rows[0].crossed_today);
    }

    #[test]
    fn test_first_observation_in_zone_counts_as_cross() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "AAPL", &[(1, 105.0)]);

        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows[0].close_prev, None);
        assert_eq!(rows[0].pct_change, None);
        assert!(rows[0].crossed_today);
    }

    #[test]
    fn test_below_and_above_statuses() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "LOW", 100.0, 110.0, true);
        watch(&mut conn, "UP", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "LOW", &[(2, 95.0), (1, 90.0)]);
        write_closes(&mut conn, &lake, "UP", &[(2, 115.0), (1, 120.0)]);

        let rows = zone_status_rows(&conn).unwrap();
        let low = rows.iter().find(|r| r.ticker == "LOW").unwrap();
        let up = rows.iter().find(|r| r.ticker == "UP").unwrap();
        assert_eq!(low.zone_status, ZoneStatus::Below);
        assert_eq!(up.zone_status, ZoneStatus::Above);
        assert!(!low.crossed_today);
        assert!(!up.crossed_today);
    }

    #[test]
    fn test_watched_without_observations_reads_no_data() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        watch(&mut conn, "NVDA", 500.0, 520.0, true);
        // Only AAPL has observations; NVDA must still get a row.
        write_closes(&mut conn, &lake, "AAPL", &[(1, 105.0)]);

        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        let nvda = rows.iter().find(|r| r.ticker == "NVDA").unwrap();
        assert_eq!(nvda.zone_status, ZoneStatus::NoData);
        assert_eq!(nvda.close_now, None);
        assert_eq!(nvda.last_updated, None);
        assert!(!nvda.crossed_today);
    }

    #[test]
    fn test_zero_previous_close_has_null_pct_change() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "PENNY", 1.0, 2.0, true);
        write_closes(&mut conn, &lake, "PENNY", &[(2, 0.0), (1, 1.5)]);

        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows[0].close_prev, Some(0.0));
        assert_eq!(rows[0].pct_change, None);
    }

    #[test]
    fn test_unwatched_tickers_never_appear() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "AAPL", &[(1, 105.0)]);
        write_closes(&mut conn, &lake, "GME", &[(1, 20.0)]);

        let rows = zone_status_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "AAPL");
    }

    #[test]
    fn test_empty_lake_fallback_rows() {
        let (mut conn, _lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);

        let rows = watchlist_status_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].zone_status, ZoneStatus::NoData);
    }

    #[test]
    fn test_alert_on_daily_cross() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        // Yesterday closed below the zone, today inside it.
        write_closes(&mut conn, &lake, "AAPL", &[(26, 95.0), (1, 105.0)]);

        let candidates = alert_candidates(&conn).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.ticker, "AAPL");
        assert_eq!(c.close_now, 105.0);
        assert_eq!(c.close_prev, 95.0);
        assert_eq!(c.date, (Utc::now() - Duration::hours(1)).date_naive());
    }

    #[test]
    fn test_alert_respects_notify_flag() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, false);
        write_closes(&mut conn, &lake, "AAPL", &[(26, 95.0), (1, 105.0)]);

        assert!(alert_candidates(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_alert_needs_two_daily_closes() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "AAPL", &[(1, 105.0)]);

        assert!(alert_candidates(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_alert_uses_last_tick_as_daily_close() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        // Yesterday ticked into the zone intraday but closed below it, so
        // today's close still counts as a cross.
        write_closes(
            &mut conn,
            &lake,
            "AAPL",
            &[(30, 105.0), (26, 95.0), (1, 106.0)],
        );

        let candidates = alert_candidates(&conn).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].close_prev, 95.0);
    }

    #[test]
    fn test_no_alert_when_already_in_zone_yesterday() {
        let (mut conn, lake, _dir) = setup();
        watch(&mut conn, "AAPL", 100.0, 110.0, true);
        write_closes(&mut conn, &lake, "AAPL", &[(26, 104.0), (1, 106.0)]);

        assert!(alert_candidates(&conn).unwrap().is_empty());
    }
}
