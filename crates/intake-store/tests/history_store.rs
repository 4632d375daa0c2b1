//! History store behaviour across both backends

use chrono::{TimeZone, Utc};
use intake_core::{FlightHistory, FlightPayload, HistorySummary, RecordId, StoredFlightRecord};
use intake_store::{InMemoryHistory, JsonFileHistory, HISTORY_FILE_NAME};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn record(owner: &str, airline: &str, guests: u32) -> StoredFlightRecord {
    StoredFlightRecord::new(
        FlightPayload {
            airline: airline.to_string(),
            arrival_date: "2030-10-17".to_string(),
            arrival_time: "02:30 PM".to_string(),
            flight_number: "DL404".to_string(),
            num_of_guests: guests,
            comments: Some("window seat".to_string()),
        },
        owner,
        Utc.with_ymd_and_hms(2030, 10, 1, 12, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn json_file_round_trips_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileHistory::in_dir(dir.path());

    let first = record("a@example.com", "Delta", 2);
    let second = record("b@example.com", "KLM", 1);
    store.append(first.clone()).await.unwrap();
    store.append(second.clone()).await.unwrap();

    // Fresh handle reads what the first one wrote
    let reopened = JsonFileHistory::in_dir(dir.path());
    assert_eq!(reopened.all().await.unwrap(), vec![first, second]);
    assert!(!dir.path().join("userFlights.json.tmp").exists());
}

#[tokio::test]
async fn json_file_uses_legacy_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileHistory::in_dir(dir.path());
    store.append(record("a@example.com", "Delta", 2)).await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join(HISTORY_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value[0];

    assert_eq!(entry["userEmail"], "a@example.com");
    assert_eq!(entry["flightNumber"], "DL404");
    assert_eq!(entry["numOfGuests"], 2);
    assert!(entry["submittedAt"].is_string());
}

#[tokio::test]
async fn json_file_reads_timestamp_ids_and_keeps_appending() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileHistory::in_dir(dir.path());
    std::fs::write(
        store.path(),
        r#"[{
            "airline": "Delta",
            "arrivalDate": "2025-10-20",
            "arrivalTime": "02:30 PM",
            "flightNumber": "DL404",
            "numOfGuests": 2,
            "comments": "window seat",
            "id": "1697045000000",
            "submittedAt": "2025-10-16T14:30:00.000Z",
            "userEmail": "a@example.com"
        }]"#,
    )
    .unwrap();

    let existing = store.all().await.unwrap();
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].id, RecordId::from_raw("1697045000000"));
    assert_eq!(existing[0].owner_email, "a@example.com");

    let added = record("a@example.com", "KLM", 1);
    store.append(added.clone()).await.unwrap();

    let all = store.all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id.as_str(), "1697045000000");
    assert_eq!(all[1], added);
}

#[tokio::test]
async fn json_file_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = JsonFileHistory::in_dir(&nested);

    store.append(record("a@example.com", "Delta", 1)).await.unwrap();
    assert!(nested.join(HISTORY_FILE_NAME).exists());
}

#[tokio::test]
async fn concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileHistory::in_dir(dir.path()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .append(record("a@example.com", &format!("Air{i}"), 1))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.all().await.unwrap().len(), 8);
}

#[tokio::test]
async fn records_are_filtered_per_owner() {
    let store = InMemoryHistory::with_records(vec![
        record("a@example.com", "Delta", 2),
        record("b@example.com", "KLM", 4),
        record("a@example.com", "United", 1),
    ]);

    let mine = store.records_for("a@example.com").await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.owner_email == "a@example.com"));

    let summary = HistorySummary::load(&store, "a@example.com").await.unwrap();
    assert_eq!(summary.total_guests, 3);
    assert_eq!(summary.unique_airlines, 2);

    let nobody = HistorySummary::load(&store, "c@example.com").await.unwrap();
    assert!(nobody.is_empty());
}
