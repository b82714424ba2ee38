//! Save/load persistence with schema tolerance
//!
//! Features:
//! - Versioned JSON envelope under namespaced keys
//! - Field-level fallback to defaults on corrupt or missing data
//! - Bare (pre-envelope) records still load

pub mod session;

pub use session::{MemorySessionStore, PersistentSessionStore, SessionRecord, SessionStore};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;
use crate::platform::{KeyValueStorage, now_ms};

/// Current schema version written into every envelope
pub const SCHEMA_VERSION: u32 = 1;

/// Prefix shared by every key this crate writes
pub const KEY_NAMESPACE: &str = "dish_guessr";

/// Build the storage key for a named value
pub fn storage_key(name: &str) -> String {
    format!("{KEY_NAMESPACE}.{name}")
}

/// Wrapper stored around every persisted value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    /// Unix timestamp (ms) of the write
    pub saved_at: f64,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            version: SCHEMA_VERSION,
            saved_at: now_ms(),
            payload,
        }
    }
}

/// Serialize `value` in an envelope and write it under `key`
pub fn write_value<K, T>(storage: &mut K, key: &str, value: &T) -> Result<(), StorageError>
where
    K: KeyValueStorage + ?Sized,
    T: Serialize,
{
    let json = serde_json::to_string(&Envelope::new(value))?;
    storage.set(key, &json)
}

/// Read the raw JSON payload stored under `key`.
///
/// Returns `None` when nothing is stored or the text is not JSON at all.
/// A document without an envelope is returned whole, which is how values
/// written before versioning look.
pub fn read_payload<K>(storage: &K, key: &str) -> Option<Value>
where
    K: KeyValueStorage + ?Sized,
{
    let json = storage.get(key)?;
    let mut doc: Value = match serde_json::from_str(&json) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Discarding unreadable {key}: {e}");
            return None;
        }
    };

    if doc.get("payload").is_none() {
        return Some(doc);
    }
    let obj = doc.as_object_mut()?;
    match obj.get("version").and_then(Value::as_u64) {
        Some(v) if v == u64::from(SCHEMA_VERSION) => {}
        Some(v) => log::info!("{key} was written by schema v{v}, reading leniently"),
        None => log::info!("{key} has no schema version, reading leniently"),
    }
    obj.remove("payload")
}

/// Decode one field of an object, falling back to the default on any problem
pub fn field_or_default<T>(obj: &serde_json::Map<String, Value>, name: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match obj.get(name) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("Stored field `{name}` is unreadable ({e}), using default");
            T::default()
        }),
    }
}

/// Decode a whole value, falling back to the default if anything is off
pub fn read_or_default<K, T>(storage: &K, key: &str) -> T
where
    K: KeyValueStorage + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(payload) = read_payload(storage, key) else {
        return T::default();
    };
    serde_json::from_value(payload).unwrap_or_else(|e| {
        log::warn!("Stored {key} is unreadable ({e}), using defaults");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn test_write_then_read_payload() {
        let mut storage = MemoryStorage::new();
        write_value(&mut storage, "dish_guessr.sample", &Sample { n: 4 }).unwrap();

        let raw = storage.get("dish_guessr.sample").unwrap();
        assert!(raw.contains("\"version\":1"));

        let sample: Sample = read_or_default(&storage, "dish_guessr.sample");
        assert_eq!(sample, Sample { n: 4 });
    }

    #[test]
    fn test_bare_document_is_accepted() {
        let mut storage = MemoryStorage::new();
        storage.set("k", "{\"n\": 9}").unwrap();
        let sample: Sample = read_or_default(&storage, "k");
        assert_eq!(sample.n, 9);
    }

    #[test]
    fn test_garbage_reads_as_default() {
        let mut storage = MemoryStorage::new();
        storage.set("k", "\u{0}nope").unwrap();
        let sample: Sample = read_or_default(&storage, "k");
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_future_version_still_reads() {
        let mut storage = MemoryStorage::new();
        storage
            .set("k", r#"{"version": 7, "saved_at": 0, "payload": {"n": 2}, "extra": true}"#)
            .unwrap();
        let sample: Sample = read_or_default(&storage, "k");
        assert_eq!(sample.n, 2);
    }

    #[test]
    fn test_storage_key_is_namespaced() {
        assert_eq!(storage_key("session"), "dish_guessr.session");
    }
}
