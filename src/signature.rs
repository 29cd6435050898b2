//! Content signature for deduplication.
//!
//! Two scrapes of the same draw must hash identically no matter when or
//! how often they run; any change in source, date, time slot, or payload
//! must produce a different signature. The store's unique index on this
//! value is the sole dedup guard.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// SHA-256 hex over `source|draw_date|draw_time|result_text`.
///
/// The `|` separator keeps field boundaries unambiguous; a missing
/// `draw_time` signs as the empty string. Callers normalize whitespace
/// and formatting before signing.
pub fn compute_signature(
    source: &str,
    draw_date: NaiveDate,
    draw_time: Option<&str>,
    result_text: &str,
) -> String {
    let value = format!(
        "{}|{}|{}|{}",
        source,
        draw_date.format("%Y-%m-%d"),
        draw_time.unwrap_or(""),
        result_text
    );
    let digest = Sha256::digest(value.as_bytes());
    format!("{digest:x}")
}
