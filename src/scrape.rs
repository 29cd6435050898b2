//! Extracts the latest draw from scraped HTML.
//!
//! The mirrors disagree on markup but all render the draw as short text
//! lines near the top of the page: a date, an optional time slot label,
//! and the winning numbers. We decode entities, flatten tags to line
//! breaks, and scan the text with a few fixed patterns.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;

/// A normalized draw record, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub draw_date: NaiveDate,
    pub draw_time: Option<String>,
    pub result_text: String,
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

fn re_dates() -> &'static [Regex] {
    static RE: OnceCell<Vec<Regex>> = OnceCell::new();
    RE.get_or_init(|| {
        vec![
            Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap(),
            Regex::new(r"(\d{2}-\d{2}-\d{4})").unwrap(),
            Regex::new(r"(\d{2}/\d{2}/\d{4})").unwrap(),
        ]
    })
}

fn re_time() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // "13:30" or "1PM" / "1:30 PM" style labels
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2}:\d{2}(?:\s*(?:AM|PM))?|\d{1,2}\s*(?:AM|PM))\b").unwrap()
    })
}

fn re_result_label() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)result\s*[:\-]?\s*([A-Za-z0-9\- ]{2,})").unwrap())
}

/// Flatten HTML to trimmed text lines.
fn text_lines(html: &str) -> Vec<String> {
    let decoded = html_escape::decode_html_entities(html).to_string();
    let flat = re_tags().replace_all(&decoded, "\n");
    flat.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.contains('/') {
        return NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok();
    }
    // ISO first, else DD-MM-YYYY
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d-%m-%Y"))
        .ok()
}

fn extract_date(text: &str) -> Option<NaiveDate> {
    for re in re_dates() {
        for cap in re.captures_iter(text) {
            if let Some(d) = parse_date(&cap[1]) {
                return Some(d);
            }
        }
    }
    None
}

fn is_bare_date_line(line: &str) -> bool {
    re_dates()
        .iter()
        .any(|re| re.find(line).is_some_and(|m| m.as_str().len() == line.len()))
}

fn extract_result_text(text: &str, lines: &[String]) -> Option<String> {
    if let Some(cap) = re_result_label().captures(text) {
        return Some(cap[1].trim().to_string());
    }
    // Fallback: first short digit-bearing line that is not date/time chrome.
    for line in lines {
        if !line.chars().any(|c| c.is_ascii_digit()) || line.len() > 50 {
            continue;
        }
        let lowered = line.to_lowercase();
        if lowered.contains("date") || lowered.contains("time") || is_bare_date_line(line) {
            continue;
        }
        return Some(line.clone());
    }
    None
}

/// Parse the latest draw out of a fetched page.
///
/// Errors when no draw date or no result payload can be found; the
/// resolver treats that as terminal for the origin and moves on.
pub fn parse_latest(html: &str) -> Result<DrawRecord> {
    let lines = text_lines(html);
    let text = lines.join("\n");

    let draw_date = extract_date(&text).ok_or_else(|| anyhow!("no draw date in content"))?;
    let draw_time = re_time()
        .captures(&text)
        .map(|cap| cap[1].trim().to_string());
    let result_text =
        extract_result_text(&text, &lines).ok_or_else(|| anyhow!("no result text in content"))?;

    Ok(DrawRecord {
        draw_date,
        draw_time,
        result_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_result_block() {
        let html = r#"
            <div class="latest-result">
              <h2>Kolkata FF</h2>
              <p>Date: 2024-01-01</p>
              <p>Time: 1PM</p>
              <p>Result: 12-34-56</p>
            </div>"#;
        let rec = parse_latest(html).unwrap();
        assert_eq!(rec.draw_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rec.draw_time.as_deref(), Some("1PM"));
        assert_eq!(rec.result_text, "12-34-56");
    }

    #[test]
    fn normalizes_slash_dates_and_clock_times() {
        let html = "<main>Draw 02/01/2024 at 13:30<br>Result: 7-8-9</main>";
        let rec = parse_latest(html).unwrap();
        assert_eq!(rec.draw_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rec.draw_time.as_deref(), Some("13:30"));
        assert_eq!(rec.result_text, "7-8-9");
    }

    #[test]
    fn falls_back_to_first_numeric_line_without_label() {
        let html = "<article><span>31-12-2023</span><span>88-12</span></article>";
        let rec = parse_latest(html).unwrap();
        assert_eq!(rec.draw_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert!(rec.draw_time.is_none());
        assert_eq!(rec.result_text, "88-12");
    }

    #[test]
    fn rejects_pages_without_a_draw() {
        assert!(parse_latest("<html><body>maintenance</body></html>").is_err());
        // date but no numbers anywhere else
        assert!(parse_latest("<p>2024-01-01</p>").is_err());
    }

    #[test]
    fn decodes_entities_before_matching() {
        let html = "<p>Result:&nbsp;12-34</p><p>2024-05-06</p>";
        let rec = parse_latest(html).unwrap();
        assert_eq!(rec.result_text, "12-34");
    }
}
