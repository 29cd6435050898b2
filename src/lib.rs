// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod cycle;
pub mod fetch;
pub mod metrics;
pub mod notify;
pub mod prune;
pub mod resolve;
pub mod scrape;
pub mod signature;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Config;
pub use crate::cycle::{run_cycle, CycleError, CycleOutcome};
pub use crate::notify::{Notifier, ResultAlert};
pub use crate::store::{InsertOutcome, NewResult, Store, StoredResult};
