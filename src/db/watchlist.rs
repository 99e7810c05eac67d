//! Watchlist reconciliation and reads
//!
//! The persisted `watchlist` table is a mirror of the declared
//! configuration, nothing more: reconciliation stages the declared rows,
//! collapses duplicate tickers deterministically, and swaps the result in,
//! all inside one transaction. Rows absent from the declaration are gone
//! after the swap.

use crate::db::models::{join_tags, split_tags, WatchItem};
use crate::error::Result;
use duckdb::{params, Connection};

/// Replace the watchlist with the declared items. Returns the persisted row
/// count after duplicate merge.
///
/// Duplicate tickers merge into one row: `notify_on_cross` is OR-ed,
/// `cooloff_days` takes the maximum, every other column keeps the value of
/// an arbitrary duplicate.
pub fn replace_watchlist(conn: &mut Connection, items: &[WatchItem]) -> Result<usize> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE OR REPLACE TEMP TABLE watchlist_stage AS
         SELECT * FROM watchlist WHERE 1 = 0",
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO watchlist_stage
                 (ticker, currency, zone_low, zone_high, notify_on_cross,
                  cooloff_days, tags, notes, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, now())",
        )?;
        for item in items {
            stmt.execute(params![
                item.ticker,
                item.currency,
                item.zone_low,
                item.zone_high,
                item.notify_on_cross,
                item.cooloff_days as i64,
                join_tags(&item.tags),
                item.notes,
            ])?;
        }
    }

    tx.execute("DELETE FROM watchlist", [])?;
    tx.execute(
        "INSERT INTO watchlist
         SELECT ticker,
                any_value(currency),
                any_value(zone_low),
                any_value(zone_high),
                bool_or(notify_on_cross),
                max(cooloff_days),
                any_value(tags),
                any_value(notes),
                max(updated_at)
         FROM watchlist_stage
         GROUP BY ticker",
        [],
    )?;
    tx.execute_batch("DROP TABLE watchlist_stage")?;

    let persisted: i64 = tx.query_row("SELECT count(*) FROM watchlist", [], |row| row.get(0))?;
    tx.commit()?;

    tracing::info!(
        "Watchlist reconciled: {} declared, {} persisted",
        items.len(),
        persisted
    );
    Ok(persisted as usize)
}

/// All persisted watch items, ordered by ticker.
pub fn watch_items(conn: &Connection) -> Result<Vec<WatchItem>> {
    let mut stmt = conn.prepare(
        "SELECT ticker, currency, zone_low, zone_high, notify_on_cross,
                cooloff_days, tags, notes
         FROM watchlist
         ORDER BY ticker",
    )?;

    let items = stmt
        .query_map([], |row| {
            Ok(WatchItem {
                ticker: row.get(0)?,
                currency: row.get(1)?,
                zone_low: row.get(2)?,
                zone_high: row.get(3)?,
                notify_on_cross: row.get(4)?,
                cooloff_days: row.get::<_, i64>(5)? as u32,
                tags: split_tags(&row.get::<_, String>(6)?),
                notes: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

/// All persisted tickers, ordered.
pub fn tickers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT ticker FROM watchlist ORDER BY ticker")?;
    let tickers = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tickers)
}
