//! fetch-cycle — runs exactly one fetch→persist→notify cycle and exits.
//!
//! Meant to be invoked by cron (e.g. every 5 minutes). Overlapping runs
//! are safe: the store's signature constraint is the dedup guard. Exit
//! status: 0 for inserted or duplicate, 1 when no origin was usable,
//! 2 on a storage failure.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use kolkataff_watcher::config::Config;
use kolkataff_watcher::cycle::{run_cycle, CycleError, CycleOutcome};
use kolkataff_watcher::fetch::HttpFetcher;
use kolkataff_watcher::metrics::Metrics;
use kolkataff_watcher::notify::telegram::TelegramNotifier;
use kolkataff_watcher::notify::Notifier;
use kolkataff_watcher::store::Store;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kolkataff_watcher=info,warn")),
        )
        .init();

    let cfg = Config::from_env();

    // This process increments all the cycle counters; without a recorder
    // they would be dropped as no-ops. The snapshot is logged on exit for
    // log-based scraping, since a cron run outlives no /metrics endpoint.
    let metrics = Metrics::init(cfg.retention_days);

    let store = match Store::open(&cfg.data_dir).await {
        Ok(s) => s,
        Err(err) => {
            tracing::error!(error = %err, "storage-fatal: cannot open store");
            return ExitCode::from(2);
        }
    };

    let notifier = TelegramNotifier::from_env();
    if notifier.is_none() {
        tracing::info!("telegram credentials not set, notifier disabled");
    }
    let notifier_ref = notifier.as_ref().map(|n| n as &dyn Notifier);

    let fetcher = HttpFetcher::new();
    let exit = match run_cycle(&fetcher, &store, notifier_ref, &cfg).await {
        Ok(CycleOutcome::Inserted(row)) => {
            tracing::info!(id = row.id, signature = %row.signature, "cycle done: inserted");
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::Duplicate) => {
            tracing::info!("cycle done: duplicate");
            ExitCode::SUCCESS
        }
        Err(err @ CycleError::OriginExhausted(_)) => {
            tracing::error!(error = %err, "cycle failed");
            ExitCode::from(1)
        }
        Err(err @ CycleError::Storage(_)) => {
            tracing::error!(error = %err, "cycle failed");
            ExitCode::from(2)
        }
    };

    tracing::debug!(prometheus = %metrics.handle.render(), "cycle metrics snapshot");
    exit
}
