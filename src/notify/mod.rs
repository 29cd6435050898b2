//! Outbound notification for newly inserted results.
//!
//! The gate is decided by the caller: a notifier is only handed results
//! the store reported as fresh insertions. Transport failure is the
//! caller's to log; persistence never rolls back on a failed send.

pub mod telegram;

use anyhow::Result;
use chrono::NaiveDate;

/// What a notification says about a draw.
#[derive(Debug, Clone)]
pub struct ResultAlert {
    pub draw_date: NaiveDate,
    pub draw_time: Option<String>,
    pub result_text: String,
}

/// Plain-text message body, one line per known field.
pub fn format_message(alert: &ResultAlert) -> String {
    let mut lines = vec![
        "Kolkata FF Update".to_string(),
        format!("Date: {}", alert.draw_date.format("%Y-%m-%d")),
    ];
    if let Some(t) = alert.draw_time.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Time: {t}"));
    }
    lines.push(format!("Result: {}", alert.result_text));
    lines.join("\n")
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &ResultAlert) -> Result<()>;
}
