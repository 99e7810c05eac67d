//! Database migrations

use crate::error::Result;
use duckdb::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS migrations (
            name VARCHAR PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT current_timestamp
        )",
    )?;

    run_migration(conn, "001_watchlist", CREATE_WATCHLIST_TABLE)?;

    tracing::debug!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_WATCHLIST_TABLE: &str = "
CREATE TABLE IF NOT EXISTS watchlist (
    ticker VARCHAR PRIMARY KEY,
    currency VARCHAR NOT NULL DEFAULT 'USD',
    zone_low DOUBLE NOT NULL,
    zone_high DOUBLE NOT NULL,
    notify_on_cross BOOLEAN NOT NULL DEFAULT TRUE,
    cooloff_days INTEGER NOT NULL DEFAULT 1,
    tags VARCHAR NOT NULL DEFAULT '',
    notes VARCHAR NOT NULL DEFAULT '',
    updated_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);
";
