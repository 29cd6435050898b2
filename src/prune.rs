//! Time-based retention.
//!
//! Pruning keys off `draw_date`, not `created_at`: a draw fetched late
//! ages by the draw itself. Best-effort — a pruning failure is logged and
//! never fails the cycle or delays the notification path.

use chrono::{Days, Utc};
use metrics::counter;

use crate::store::Store;

/// Delete results older than `retention_days` before today (UTC).
pub async fn prune(store: &Store, retention_days: u32) {
    let today = Utc::now().date_naive();
    let Some(cutoff) = today.checked_sub_days(Days::new(retention_days as u64)) else {
        tracing::warn!(retention_days, "retention horizon underflows calendar, skipping prune");
        return;
    };

    match store.delete_older_than(cutoff).await {
        Ok(0) => {}
        Ok(deleted) => {
            counter!("prune_deleted_total").increment(deleted);
            tracing::info!(deleted, cutoff = %cutoff, "pruned old results");
        }
        Err(err) => {
            tracing::warn!(error = %err, "prune failed");
        }
    }
}
