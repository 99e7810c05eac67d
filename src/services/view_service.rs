//! Price view maintenance service

use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Outcome of one view rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct ViewResult {
    /// Partition files the view now covers.
    pub partition_files: usize,
    /// Rows in the refreshed `prices` table.
    pub materialized_rows: usize,
}

/// Service for rebuilding `v_prices` and its materialized copy
pub struct ViewService;

impl ViewService {
    /// Re-point the view at the current partition set, then refresh the
    /// materialized table from it. Safe to run any number of times.
    pub fn rebuild(state: &AppState) -> Result<ViewResult> {
        info!("ViewService::rebuild - lake: {}", state.lake.root().display());

        let partition_files = state.db.rebuild_price_view(&state.lake)?;
        let materialized_rows = state.db.materialize_prices()?;

        Ok(ViewResult {
            partition_files,
            materialized_rows,
        })
    }
}
