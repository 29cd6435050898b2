//! Environment-driven configuration, parsed once per process.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::RetryPolicy;

/// Fixed mirror priority when `SITE_URL` is unset.
pub const FALLBACK_ORIGINS: &[&str] = &[
    "https://kolkataff.tv/",
    "https://kolkataff.fun/",
    "https://kolkataff.in/",
];

pub const DEFAULT_RETENTION_DAYS: u32 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// `SITE_URL`: forces a single origin and disables fallback.
    pub site_url: Option<String>,
    /// `DATA_DIR`: directory holding `results.db` (and the optional
    /// `last_fetch.html` dump).
    pub data_dir: PathBuf,
    /// `RETENTION_DAYS`: pruning horizon, default 60.
    pub retention_days: u32,
    /// `FETCH_MAX_ATTEMPTS` / `FETCH_BASE_DELAY_MS` / `FETCH_MAX_DELAY_MS`.
    pub retry: RetryPolicy,
    /// `SAVE_HTML=1`: dump the last fetched page under `data_dir`.
    pub save_html: bool,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            site_url: env_non_empty("SITE_URL"),
            data_dir: PathBuf::from(
                std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            ),
            retention_days: env_parse("RETENTION_DAYS", DEFAULT_RETENTION_DAYS),
            retry: RetryPolicy {
                max_attempts: env_parse("FETCH_MAX_ATTEMPTS", defaults.max_attempts),
                base_delay: Duration::from_millis(env_parse(
                    "FETCH_BASE_DELAY_MS",
                    defaults.base_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(env_parse(
                    "FETCH_MAX_DELAY_MS",
                    defaults.max_delay.as_millis() as u64,
                )),
            },
            save_html: std::env::var("SAVE_HTML").is_ok_and(|v| v == "1"),
        }
    }

    /// Origins to attempt this cycle, in order. A forced `SITE_URL` is the
    /// only candidate; otherwise the fixed mirror list.
    pub fn origins(&self) -> Vec<String> {
        match &self.site_url {
            Some(url) => vec![url.clone()],
            None => FALLBACK_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: None,
            data_dir: PathBuf::from("./data"),
            retention_days: DEFAULT_RETENTION_DAYS,
            retry: RetryPolicy::default(),
            save_html: false,
        }
    }
}
