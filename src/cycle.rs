//! One fetch→persist→notify cycle.
//!
//! Order matters: the insert must be durable before the notifier fires,
//! and nothing is written before a successful parse. A duplicate is a
//! successful, silent outcome. The cycle is safe to run concurrently
//! with itself; the store's signature constraint is the only guard and
//! the only one needed.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::notify::{Notifier, ResultAlert};
use crate::resolve::{self, Resolved};
use crate::signature::compute_signature;
use crate::store::{InsertOutcome, NewResult, Store, StoredResult};
use crate::{prune, scrape};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycle_runs_total", "Fetch cycles started.");
        describe_counter!("results_inserted_total", "Results newly persisted.");
        describe_counter!("results_duplicate_total", "Cycles that re-saw known content.");
        describe_counter!("origin_failures_total", "Origins skipped after fetch/parse failure.");
        describe_counter!("origin_exhausted_total", "Cycles where no origin was usable.");
        describe_counter!("fetch_attempts_total", "Individual upstream HTTP attempts.");
        describe_counter!("fetch_retries_total", "Attempts retried after transient failure.");
        describe_counter!("prune_deleted_total", "Rows removed by retention pruning.");
        describe_counter!("notify_failures_total", "Notification sends that failed.");
    });
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// Fresh content: persisted and (if configured) notified.
    Inserted(StoredResult),
    /// Known content: nothing written, nothing sent.
    Duplicate,
}

/// Failures that escalate to the scheduler, per taxonomy kind.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("origin-exhausted: {0}")]
    OriginExhausted(#[from] resolve::OriginsExhausted),
    #[error("storage-fatal: {0}")]
    Storage(#[source] anyhow::Error),
}

fn build_new_result(resolved: &Resolved) -> NewResult {
    let scrape::DrawRecord {
        draw_date,
        draw_time,
        result_text,
    } = resolved.record.clone();
    let signature = compute_signature(
        &resolved.source,
        draw_date,
        draw_time.as_deref(),
        &result_text,
    );
    NewResult {
        source: resolved.source.clone(),
        draw_date,
        draw_time,
        result_text,
        signature,
    }
}

fn save_html_dump(cfg: &Config, html: &str) {
    let path = cfg.data_dir.join("last_fetch.html");
    if let Err(err) = std::fs::create_dir_all(&cfg.data_dir)
        .and_then(|_| std::fs::write(&path, html))
    {
        tracing::warn!(path = %path.display(), error = %err, "failed to dump fetched html");
    }
}

/// Run one complete cycle against the given collaborators.
pub async fn run_cycle(
    fetcher: &dyn PageFetcher,
    store: &Store,
    notifier: Option<&dyn Notifier>,
    cfg: &Config,
) -> Result<CycleOutcome, CycleError> {
    ensure_metrics_described();
    counter!("cycle_runs_total").increment(1);

    let origins = cfg.origins();
    let resolved = match resolve::resolve_latest(fetcher, &origins, &cfg.retry).await {
        Ok(r) => r,
        Err(err) => {
            counter!("origin_exhausted_total").increment(1);
            return Err(err.into());
        }
    };

    if cfg.save_html {
        save_html_dump(cfg, &resolved.raw_html);
    }

    let new = build_new_result(&resolved);
    let outcome = store.insert(&new).await.map_err(CycleError::Storage)?;

    // Best-effort, runs on duplicates too; never blocks notification.
    prune::prune(store, cfg.retention_days).await;

    match outcome {
        InsertOutcome::Duplicate => {
            counter!("results_duplicate_total").increment(1);
            tracing::info!(signature = %new.signature, "duplicate result, cycle ends silently");
            Ok(CycleOutcome::Duplicate)
        }
        InsertOutcome::Inserted(stored) => {
            counter!("results_inserted_total").increment(1);
            tracing::info!(
                signature = %stored.signature,
                draw_date = %stored.draw_date,
                source = %stored.source,
                "new result persisted"
            );

            if let Some(n) = notifier {
                let alert = ResultAlert {
                    draw_date: stored.draw_date,
                    draw_time: stored.draw_time.clone(),
                    result_text: stored.result_text.clone(),
                };
                // The row is durable either way; a failed send is logged,
                // never retried at cycle level, never rolled back.
                if let Err(err) = n.send(&alert).await {
                    counter!("notify_failures_total").increment(1);
                    tracing::warn!(error = %err, "notification failed");
                }
            }

            Ok(CycleOutcome::Inserted(stored))
        }
    }
}
