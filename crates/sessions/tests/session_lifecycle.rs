//! Full session lifecycle against the in-memory table: absent → live →
//! expired → absent, with a simulated clock.

use std::sync::Arc;
use std::time::Duration;

use ts_domain::config::SessionConfig;
use ts_sessions::record::primary_key;
use ts_sessions::{SessionHandler, SessionStore};
use ts_tablestore::{Clock, ColumnValue, InMemoryTable, KeyValueTable, ManualClock};

const TABLE: &str = "php_session";

fn store_with(
    config: SessionConfig,
) -> (Arc<SessionStore>, Arc<InMemoryTable>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let table = Arc::new(InMemoryTable::with_clock(clock.clone()));
    let store = SessionStore::new(table.clone(), TABLE, config).with_clock(clock.clone());
    (Arc::new(store), table, clock)
}

#[tokio::test]
async fn prefixed_session_expires_after_ttl() {
    let (store, table, clock) = store_with(SessionConfig {
        expire: 1,
        prefix: "sess:".into(),
        data_compress: false,
    });

    store.write("abc123", b"user=42").await.unwrap();

    // The row is stored under the prefixed key with both columns.
    let cols = table
        .get_row(TABLE, &primary_key("sess:abc123"), 1)
        .await
        .unwrap();
    let value = cols.iter().find(|c| c.name == "value").unwrap();
    let expire = cols.iter().find(|c| c.name == "expire").unwrap();
    assert_eq!(value.value, ColumnValue::String("user=42".into()));
    assert_eq!(expire.value, ColumnValue::Integer(1));
    assert_eq!(value.timestamp, Some(clock.now_millis()));

    assert_eq!(store.read("abc123").await.unwrap(), b"user=42");

    clock.advance(Duration::from_millis(1_500));
    assert!(store.read("abc123").await.unwrap().is_empty());
    assert!(!table.contains(TABLE, &primary_key("sess:abc123")));

    // A later read of the now-absent session is still just empty.
    assert!(store.read("abc123").await.unwrap().is_empty());
}

#[tokio::test]
async fn compressed_sessions_round_trip_bit_for_bit() {
    let (store, _table, _clock) = store_with(SessionConfig {
        expire: 3600,
        prefix: "z:".into(),
        data_compress: true,
    });

    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"user=42".to_vec(),
        vec![0u8; 10_000],
        (0..=255u8).collect(),
        "sesión=✓".as_bytes().to_vec(),
    ];
    for (i, payload) in payloads.iter().enumerate() {
        let id = format!("s{i}");
        store.write(&id, payload).await.unwrap();
        assert_eq!(&store.read(&id).await.unwrap(), payload, "payload {i}");
    }
}

#[tokio::test]
async fn last_writer_wins_under_concurrency() {
    let (store, _table, _clock) = store_with(SessionConfig::default());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .write("shared", format!("writer={i}").as_bytes())
                .await
                .unwrap();
            store.write(&format!("own-{i}"), b"mine").await.unwrap();
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    let shared = String::from_utf8(store.read("shared").await.unwrap()).unwrap();
    assert!(shared.starts_with("writer="));
    for i in 0..16 {
        assert_eq!(store.read(&format!("own-{i}")).await.unwrap(), b"mine");
    }
}

#[tokio::test]
async fn store_serves_as_handler_trait_object() {
    let (store, table, clock) = store_with(SessionConfig {
        expire: 60,
        prefix: String::new(),
        data_compress: false,
    });
    let handler: Arc<dyn SessionHandler> = store;

    assert!(handler.delete("ghost").await.unwrap());
    assert_eq!(handler.read_string("ghost").await.unwrap(), "");

    handler.write("s", b"cart=3").await.unwrap();
    clock.advance(Duration::from_secs(60));
    assert_eq!(handler.read_string("s").await.unwrap(), "cart=3");
    clock.advance(Duration::from_millis(1));
    assert_eq!(handler.read_string("s").await.unwrap(), "");
    assert_eq!(table.row_count(TABLE), 0);
}
