// tests/store_semantics.rs
//
// Store invariants: signature uniqueness under repeated inserts, latest
// ordering, inclusive range/by-date queries, and retention deletion.

use chrono::NaiveDate;
use kolkataff_watcher::store::{InsertOutcome, NewResult, Store};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn result(draw_date: &str, sig: &str) -> NewResult {
    NewResult {
        source: "https://kolkataff.tv/".into(),
        draw_date: date(draw_date),
        draw_time: Some("1PM".into()),
        result_text: "12-34-56".into(),
        signature: sig.into(),
    }
}

#[tokio::test]
async fn double_insert_keeps_exactly_one_row() {
    let store = Store::open_in_memory().await.unwrap();
    let new = result("2024-01-01", "sig-a");

    let first = store.insert(&new).await.unwrap();
    assert!(matches!(first, InsertOutcome::Inserted(_)));

    let second = store.insert(&new).await.unwrap();
    assert!(matches!(second, InsertOutcome::Duplicate));

    assert_eq!(store.row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn inserted_row_carries_assigned_id_and_created_at() {
    let store = Store::open_in_memory().await.unwrap();
    let InsertOutcome::Inserted(row) = store.insert(&result("2024-01-01", "sig-a")).await.unwrap()
    else {
        panic!("expected fresh insert");
    };
    assert!(row.id >= 1);
    assert!(row.created_at > 0);
    assert_eq!(row.signature, "sig-a");
    assert_eq!(row.result_text, "12-34-56");
}

#[tokio::test]
async fn latest_returns_most_recent_insertion() {
    let store = Store::open_in_memory().await.unwrap();
    assert!(store.latest().await.unwrap().is_none());

    store.insert(&result("2024-01-01", "sig-1")).await.unwrap();
    store.insert(&result("2024-01-02", "sig-2")).await.unwrap();
    store.insert(&result("2024-01-03", "sig-3")).await.unwrap();

    // Inserts may share a created_at second; greatest id breaks the tie.
    let latest = store.latest().await.unwrap().unwrap();
    assert_eq!(latest.signature, "sig-3");
}

#[tokio::test]
async fn range_is_inclusive_and_by_date_is_exact() {
    let store = Store::open_in_memory().await.unwrap();
    for (d, sig) in [
        ("2024-01-01", "s1"),
        ("2024-01-02", "s2"),
        ("2024-01-03", "s3"),
        ("2024-02-01", "s4"),
    ] {
        store.insert(&result(d, sig)).await.unwrap();
    }

    let rows = store
        .range(date("2024-01-01"), date("2024-01-03"))
        .await
        .unwrap();
    let sigs: Vec<_> = rows.iter().map(|r| r.signature.as_str()).collect();
    assert_eq!(sigs, vec!["s3", "s2", "s1"]); // newest insertion first

    let day = store.by_date(date("2024-01-02")).await.unwrap();
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].signature, "s2");

    assert!(store.by_date(date("2020-05-05")).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_older_than_removes_exactly_the_old_rows_and_is_idempotent() {
    let store = Store::open_in_memory().await.unwrap();
    for (d, sig) in [
        ("2024-01-01", "s1"),
        ("2024-01-15", "s2"),
        ("2024-02-01", "s3"),
    ] {
        store.insert(&result(d, sig)).await.unwrap();
    }

    let removed = store.delete_older_than(date("2024-01-15")).await.unwrap();
    assert_eq!(removed, 1); // only s1 is strictly older

    let remaining: Vec<_> = store
        .range(date("2000-01-01"), date("2100-01-01"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.signature)
        .collect();
    assert_eq!(remaining, vec!["s3".to_string(), "s2".to_string()]);

    // Second call is a no-op.
    let removed_again = store.delete_older_than(date("2024-01-15")).await.unwrap();
    assert_eq!(removed_again, 0);
    assert_eq!(store.row_count().await.unwrap(), 2);
}

#[tokio::test]
async fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Store::open(dir.path()).await.unwrap();
        store.insert(&result("2024-01-01", "sig-a")).await.unwrap();
    }

    let store = Store::open(dir.path()).await.unwrap();
    assert_eq!(store.row_count().await.unwrap(), 1);
    let dup = store.insert(&result("2024-01-01", "sig-a")).await.unwrap();
    assert!(matches!(dup, InsertOutcome::Duplicate));
}
