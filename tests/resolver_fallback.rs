// tests/resolver_fallback.rs
//
// Source Resolver scenario: origin A times out on every attempt, B serves
// unparseable content, C succeeds, D must never be contacted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kolkataff_watcher::fetch::{FetchError, PageFetcher, RetryPolicy};
use kolkataff_watcher::resolve::resolve_latest;

const GOOD_HTML: &str = "<div class=\"latest-result\">\
    <p>Date: 2024-01-01</p><p>Time: 1PM</p><p>Result: 12-34-56</p></div>";

enum Script {
    AlwaysTimeout,
    Body(&'static str),
}

struct ScriptedFetcher {
    scripts: HashMap<&'static str, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u == &url).count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.scripts.get(url) {
            Some(Script::AlwaysTimeout) => {
                Err(FetchError::Retryable("operation timed out".into()))
            }
            Some(Script::Body(body)) => Ok(body.to_string()),
            None => panic!("unexpected origin contacted: {url}"),
        }
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    }
}

#[tokio::test]
async fn falls_through_to_first_working_origin_and_stops() {
    let fetcher = ScriptedFetcher {
        scripts: HashMap::from([
            ("http://a/", Script::AlwaysTimeout),
            ("http://b/", Script::Body("<html>under maintenance</html>")),
            ("http://c/", Script::Body(GOOD_HTML)),
            // http://d/ intentionally unscripted: contacting it panics
        ]),
        calls: Mutex::new(Vec::new()),
    };
    let origins: Vec<String> = ["http://a/", "http://b/", "http://c/", "http://d/"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let resolved = resolve_latest(&fetcher, &origins, &fast_policy())
        .await
        .expect("C should resolve");

    assert_eq!(resolved.source, "http://c/");
    assert_eq!(resolved.record.result_text, "12-34-56");

    assert_eq!(fetcher.calls_to("http://a/"), 3); // full retry budget
    assert_eq!(fetcher.calls_to("http://b/"), 1); // parse failure is terminal
    assert_eq!(fetcher.calls_to("http://c/"), 1);
    assert_eq!(fetcher.calls_to("http://d/"), 0);
}

#[tokio::test]
async fn exhausting_every_origin_reports_failure() {
    let fetcher = ScriptedFetcher {
        scripts: HashMap::from([
            ("http://a/", Script::AlwaysTimeout),
            ("http://b/", Script::Body("nothing here")),
        ]),
        calls: Mutex::new(Vec::new()),
    };
    let origins: Vec<String> = ["http://a/", "http://b/"].iter().map(|s| s.to_string()).collect();

    let err = resolve_latest(&fetcher, &origins, &fast_policy())
        .await
        .unwrap_err();
    assert_eq!(err.tried, 2);
}
