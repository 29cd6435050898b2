//! Ordered-fallback origin resolution.
//!
//! Origins are tried strictly in order; the first one whose fetch AND
//! parse both succeed wins and later origins are never contacted. A
//! per-origin failure of any kind just advances the iterator.

use metrics::counter;

use crate::fetch::{fetch_with_retry, PageFetcher, RetryPolicy};
use crate::scrape::{self, DrawRecord};

/// A parsed draw together with the origin that produced it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub source: String,
    pub record: DrawRecord,
    pub raw_html: String,
}

#[derive(Debug, thiserror::Error)]
#[error("no source reachable: all {tried} origin(s) exhausted")]
pub struct OriginsExhausted {
    pub tried: usize,
}

/// Walk `origins` until one yields parseable content.
pub async fn resolve_latest<F: PageFetcher + ?Sized>(
    fetcher: &F,
    origins: &[String],
    policy: &RetryPolicy,
) -> Result<Resolved, OriginsExhausted> {
    for origin in origins {
        let html = match fetch_with_retry(fetcher, origin, policy).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "origin failed, trying next");
                counter!("origin_failures_total").increment(1);
                continue;
            }
        };
        match scrape::parse_latest(&html) {
            Ok(record) => {
                tracing::info!(
                    origin = %origin,
                    draw_date = %record.draw_date,
                    "origin resolved"
                );
                return Ok(Resolved {
                    source: origin.clone(),
                    record,
                    raw_html: html,
                });
            }
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "unparseable content, trying next");
                counter!("origin_failures_total").increment(1);
            }
        }
    }
    Err(OriginsExhausted {
        tried: origins.len(),
    })
}
