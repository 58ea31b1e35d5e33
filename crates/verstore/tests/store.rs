//! Integration tests for `VersionedStore` over `MemoryStorage`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use verstore::{
    HostStorage, Level, MemoryLogger, MemoryStorage, StoreConfig, VersionedStore,
};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
}

fn open<T>(
    host: &MemoryStorage,
    key: &str,
    config: StoreConfig,
) -> (VersionedStore<T>, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let store = VersionedStore::with_logger(Arc::new(host.clone()), key, config, logger.clone());
    (store, logger)
}

fn raw_json(host: &MemoryStorage, key: &str) -> Value {
    let raw = host.get_item(key).unwrap().expect("raw value present");
    serde_json::from_str(&raw).unwrap()
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn stores_and_retrieves_data() {
    let host = MemoryStorage::new();
    let (store, _) = open::<User>(&host, "test-key", StoreConfig::default());
    let user = User {
        name: "John".to_string(),
    };

    store.set(&user);
    assert_eq!(store.get(), Some(user));
}

#[test]
fn set_is_visible_to_next_get_without_staleness() {
    let host = MemoryStorage::new();
    let (store, _) = open::<u32>(&host, "n", StoreConfig::default());
    for n in 0..5 {
        store.set(&n);
        assert_eq!(store.get(), Some(n));
    }
}

#[test]
fn round_trips_assorted_values() {
    let host = MemoryStorage::new();
    let (store, _) = open::<Value>(&host, "v", StoreConfig::default());
    for value in [
        json!(null),
        json!(false),
        json!(0),
        json!(""),
        json!([1, "two", { "three": 3 }]),
        json!({ "nested": { "deep": [true] } }),
    ] {
        store.set(&value);
        assert_eq!(store.get(), Some(value));
    }
}

// ============================================================================
// Absent keys and clear
// ============================================================================

#[test]
fn never_written_key_is_absent() {
    let host = MemoryStorage::new();
    let (store, _) = open::<String>(&host, "non-existent", StoreConfig::default());
    assert_eq!(store.get(), None);
    assert!(!store.exists());
}

#[test]
fn clear_removes_value() {
    let host = MemoryStorage::new();
    let (store, logger) = open::<String>(&host, "test-key", StoreConfig::default());

    store.set(&"test value".to_string());
    assert!(store.exists());

    store.clear();
    assert!(!store.exists());
    assert_eq!(store.get(), None);
    assert_eq!(
        logger.last(Level::Info).unwrap().message,
        "Item cleared from storage"
    );
}

#[test]
fn clearing_absent_key_is_harmless() {
    let host = MemoryStorage::new();
    let (store, logger) = open::<String>(&host, "never", StoreConfig::default());
    store.clear();
    assert_eq!(logger.count(Level::Error), 0);
}

// ============================================================================
// Prefix
// ============================================================================

#[test]
fn prefix_namespaces_the_raw_key() {
    let host = MemoryStorage::new();
    let (prefixed, _) = open::<String>(&host, "key", StoreConfig::default().with_prefix("app"));
    let (bare, _) = open::<String>(&host, "key", StoreConfig::default());

    prefixed.set(&"value".to_string());
    assert_eq!(prefixed.key(), "app:key");
    assert!(host.get_item("app:key").unwrap().is_some());
    assert!(host.get_item("key").unwrap().is_none());
    assert_eq!(bare.get(), None);

    bare.set(&"other".to_string());
    assert_eq!(prefixed.get().as_deref(), Some("value"));
    assert_eq!(host.keys(), vec!["app:key".to_string(), "key".to_string()]);
}

// ============================================================================
// Envelope format
// ============================================================================

#[test]
fn envelope_has_exactly_data_timestamp_version() {
    let host = MemoryStorage::new();
    let (store, _) = open::<User>(&host, "u", StoreConfig::default());
    store.set(&User {
        name: "Ann".to_string(),
    });

    let raw = host.get_item("u").unwrap().unwrap();
    assert!(raw.starts_with(r#"{"data":{"name":"Ann"},"timestamp":"#));
    assert!(raw.ends_with(r#","version":"1.0"}"#));

    let value = raw_json(&host, "u");
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert!(obj["timestamp"].is_i64());
}

#[test]
fn unversioned_envelope_omits_version() {
    let host = MemoryStorage::new();
    let (store, _) = open::<u8>(&host, "u", StoreConfig::default().without_version());
    store.set(&1);
    let value = raw_json(&host, "u");
    assert_eq!(value.as_object().unwrap().len(), 2);
    assert!(value.get("version").is_none());
}

#[test]
fn reads_envelopes_written_by_other_implementations() {
    let host = MemoryStorage::new();
    host.set_item(
        "theme",
        r#"{"data":"dark","timestamp":1705276800000,"version":"1.0"}"#,
    )
    .unwrap();
    let (store, _) = open::<String>(&host, "theme", StoreConfig::default());
    assert_eq!(store.get().as_deref(), Some("dark"));
}

#[test]
fn rewriting_same_value_refreshes_timestamp_only() {
    let host = MemoryStorage::new();
    let (store, _) = open::<u32>(&host, "t", StoreConfig::default());
    let first = store.try_set(&5).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = store.try_set(&5).unwrap();

    assert!(second > first);
    let value = raw_json(&host, "t");
    assert_eq!(value["data"], json!(5));
    assert_eq!(value["timestamp"], json!(second));
}

// ============================================================================
// Version gate
// ============================================================================

#[test]
fn version_mismatch_reads_absent_and_purges() {
    let host = MemoryStorage::new();
    let (v1, _) = open::<String>(&host, "key", StoreConfig::default().with_version("1.0"));
    let (v2, logger) = open::<String>(&host, "key", StoreConfig::default().with_version("2.0"));

    v1.set(&"old value".to_string());
    assert_eq!(v2.get(), None);
    assert!(!v2.exists());
    assert!(!v1.exists());

    let warn = logger.last(Level::Warn).expect("mismatch is logged");
    assert_eq!(warn.message, "Version mismatch, clearing storage");
    assert_eq!(warn.detail("expected"), Some(&json!("2.0")));
    assert_eq!(warn.detail("found"), Some(&json!("1.0")));
    assert_eq!(logger.count(Level::Error), 0);
}

#[test]
fn versioned_reader_purges_unversioned_envelope() {
    let host = MemoryStorage::new();
    let (bare, _) = open::<u8>(&host, "k", StoreConfig::default().without_version());
    let (versioned, _) = open::<u8>(&host, "k", StoreConfig::default());

    bare.set(&3);
    assert_eq!(versioned.get(), None);
    assert!(!versioned.exists());
}

#[test]
fn unversioned_reader_skips_version_check() {
    let host = MemoryStorage::new();
    let (writer, _) = open::<u8>(&host, "k", StoreConfig::default().with_version("9.9"));
    let (reader, logger) = open::<u8>(&host, "k", StoreConfig::default().without_version());

    writer.set(&7);
    assert_eq!(reader.get(), Some(7));
    assert!(reader.exists());
    assert_eq!(logger.count(Level::Warn), 0);
}

#[test]
fn version_bump_with_new_data_type_purges_stale_entry() {
    let host = MemoryStorage::new();
    let (v1, _) = open::<String>(&host, "key", StoreConfig::default().with_version("1.0"));
    let (v2, logger) = open::<u64>(&host, "key", StoreConfig::default().with_version("2.0"));

    v1.set(&"old value".to_string());
    assert_eq!(v2.get(), None);
    assert!(!v2.exists());

    let warn = logger.last(Level::Warn).expect("mismatch is logged");
    assert_eq!(warn.message, "Version mismatch, clearing storage");
    assert_eq!(warn.detail("found"), Some(&json!("1.0")));
    assert_eq!(logger.count(Level::Error), 0);

    v2.set(&42);
    assert_eq!(v2.get(), Some(42));
}

#[test]
fn mismatch_purge_then_rewrite_under_new_version() {
    let host = MemoryStorage::new();
    let (v1, _) = open::<u8>(&host, "k", StoreConfig::default().with_version("1"));
    let (v2, _) = open::<u8>(&host, "k", StoreConfig::default().with_version("2"));

    v1.set(&1);
    assert_eq!(v2.get(), None);
    v2.set(&2);
    assert_eq!(v2.get(), Some(2));
    assert_eq!(v1.get(), None);
    assert!(!v2.exists());
}

// ============================================================================
// Malformed values
// ============================================================================

#[test]
fn malformed_json_reads_absent_but_is_kept() {
    let host = MemoryStorage::new();
    host.set_item("broken", "{definitely not json").unwrap();
    let (store, logger) = open::<String>(&host, "broken", StoreConfig::default());

    assert_eq!(store.get(), None);
    assert!(store.exists());
    assert_eq!(
        host.get_item("broken").unwrap().as_deref(),
        Some("{definitely not json")
    );

    let error = logger.last(Level::Error).expect("parse failure is logged");
    assert_eq!(error.message, "Failed to get item from storage");
    assert_eq!(error.detail("key"), Some(&json!("broken")));
    assert!(error.detail("error").is_some());
    assert_eq!(logger.count(Level::Warn), 0);
}

#[test]
fn data_of_unexpected_shape_is_malformed_not_stale() {
    let host = MemoryStorage::new();
    let (writer, _) = open::<String>(&host, "k", StoreConfig::default());
    let (reader, logger) = open::<u64>(&host, "k", StoreConfig::default());

    writer.set(&"text".to_string());
    assert_eq!(reader.get(), None);
    assert!(reader.exists());
    assert_eq!(logger.count(Level::Error), 1);
}

// ============================================================================
// Host failures
// ============================================================================

#[test]
fn quota_failure_is_swallowed_and_prior_value_kept() {
    let host = MemoryStorage::with_quota(100);
    let (store, logger) = open::<String>(&host, "k", StoreConfig::default());

    store.set(&"fits".to_string());
    store.set(&"x".repeat(200));

    assert_eq!(store.get().as_deref(), Some("fits"));
    let error = logger.last(Level::Error).unwrap();
    assert_eq!(error.message, "Failed to save item to storage");
    assert!(error.detail("error").unwrap().as_str().unwrap().contains("quota"));
}

#[test]
fn successful_set_logs_key_and_timestamp() {
    let host = MemoryStorage::new();
    let (store, logger) = open::<u8>(&host, "k", StoreConfig::default().with_prefix("p"));
    store.set(&1);
    let info = logger.last(Level::Info).unwrap();
    assert_eq!(info.message, "Item saved to storage");
    assert_eq!(info.detail("key"), Some(&json!("p:k")));
    assert!(info.detail("timestamp").unwrap().is_i64());
}
