//! Price lake writes and the price views
//!
//! Observations land as hive-partitioned parquet under the lake root, one
//! partition directory per (ticker, date). `v_prices` is the logical read
//! surface over every partition file; `prices` is its materialized copy for
//! consumers that want a plain table instead of a parquet scan.

use crate::db::models::{fmt_date, fmt_timestamp, ts_from_micros, PriceObservation, PricePoint};
use crate::error::Result;
use crate::lake::PriceLake;
use chrono::{Days, Utc};
use duckdb::{params, Connection};
use std::path::Path;

/// Write a long-format batch into the lake. Returns the row count written.
///
/// Rows are staged in a temp table, then exported in one `COPY` keyed by
/// (ticker, date). Every partition the batch touches gets a fresh file;
/// partitions it does not touch are left alone. A re-run over the same
/// partition replaces the file wholesale, it never merges into it.
///
/// An empty batch returns without touching the database or the filesystem.
pub fn write_observations(
    conn: &mut Connection,
    lake: &PriceLake,
    rows: &[PriceObservation],
) -> Result<usize> {
    if rows.is_empty() {
        tracing::debug!("No observations to write");
        return Ok(0);
    }

    lake.ensure_root()?;

    let tx = conn.transaction()?;
    tx.execute_batch(
        "CREATE OR REPLACE TEMP TABLE lake_stage (
            ticker VARCHAR NOT NULL,
            date DATE NOT NULL,
            datetime TIMESTAMP NOT NULL,
            field VARCHAR NOT NULL,
            value DOUBLE NOT NULL
        )",
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO lake_stage (ticker, date, datetime, field, value)
             VALUES (?, CAST(? AS DATE), CAST(? AS TIMESTAMP), ?, ?)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.ticker,
                fmt_date(&row.date),
                fmt_timestamp(&row.datetime),
                row.field.as_str(),
                row.value,
            ])?;
        }
    }
    tx.commit()?;

    // COPY runs outside the transaction; it writes files, not tables.
    conn.execute_batch(&format!(
        "COPY (SELECT ticker, date, datetime, field, value
               FROM lake_stage
               ORDER BY ticker, date, datetime)
         TO '{}' (FORMAT PARQUET, PARTITION_BY (ticker, date), OVERWRITE_OR_IGNORE 1)",
        sql_path(lake.root()),
    ))?;
    conn.execute_batch("DROP TABLE lake_stage")?;

    tracing::info!(
        "Wrote {} observations under {}",
        rows.len(),
        lake.root().display()
    );
    Ok(rows.len())
}

/// Point `v_prices` at the current partition set. Returns the partition
/// file count.
///
/// With no partition files yet the view keeps a fixed empty schema
/// (ticker, date, close) so downstream queries still bind.
pub fn rebuild_price_view(conn: &Connection, lake: &PriceLake) -> Result<usize> {
    let files = lake.parquet_files()?;

    if files.is_empty() {
        conn.execute_batch(
            "CREATE OR REPLACE VIEW v_prices AS
             SELECT CAST(NULL AS VARCHAR) AS ticker,
                    CAST(NULL AS DATE) AS date,
                    CAST(NULL AS DOUBLE) AS close
             WHERE 1 = 0",
        )?;
        tracing::debug!("Price lake is empty, v_prices bound to fixed schema");
    } else {
        conn.execute_batch(&format!(
            "CREATE OR REPLACE VIEW v_prices AS
             SELECT * FROM read_parquet('{}', hive_partitioning = true)",
            sql_path(&lake.glob()),
        ))?;
    }

    Ok(files.len())
}

/// Clear and fully repopulate the materialized `prices` table from
/// `v_prices`, then index it on (ticker, date). Idempotent.
pub fn materialize_prices(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "BEGIN TRANSACTION;
         CREATE OR REPLACE TABLE prices AS SELECT * FROM v_prices;
         CREATE INDEX IF NOT EXISTS idx_prices_ticker_date ON prices (ticker, date);
         COMMIT;",
    )?;

    let count: i64 = conn.query_row("SELECT count(*) FROM prices", [], |row| row.get(0))?;
    tracing::info!("Materialized prices table: {} rows", count);
    Ok(count as usize)
}

/// Close observations for one instrument over a trailing window, oldest
/// first. Callers must know the lake is non-empty; the fixed empty schema
/// has no close column to read.
pub fn price_history(conn: &Connection, ticker: &str, window_days: u32) -> Result<Vec<PricePoint>> {
    let cutoff = Utc::now() - Days::new(u64::from(window_days));

    let mut stmt = conn.prepare(
        "SELECT epoch_us(datetime), value
         FROM v_prices
         WHERE ticker = ?
           AND field = 'Close'
           AND datetime >= CAST(? AS TIMESTAMP)
         ORDER BY datetime",
    )?;
    let raw = stmt
        .query_map(params![ticker, fmt_timestamp(&cutoff)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut points = Vec::with_capacity(raw.len());
    for (us, close) in raw {
        points.push(PricePoint {
            datetime: ts_from_micros(us)?,
            close,
        });
    }
    Ok(points)
}

/// Single-quoted SQL literal form of a path.
fn sql_path(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}
