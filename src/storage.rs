/// Key-value persistence seam over chrome.storage.local

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use thiserror::Error;

pub const TIMER_STATE_KEY: &str = "timerState";
pub const TIMER_SETTINGS_KEY: &str = "timerSettings";
pub const BLOCKED_SITES_KEY: &str = "blockedSites";
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage bridge failed: {0}")]
    Bridge(String),
    #[error("failed to serialize {key}: {message}")]
    Serialize { key: String, message: String },
    #[error("failed to parse {key}: {message}")]
    Deserialize { key: String, message: String },
}

/// Asynchronous string-keyed store of JSON values.
///
/// No multi-key transactions: every read and write stands alone, and the
/// last write to a key wins.
#[async_trait(?Send)]
pub trait KeyValueStore {
    /// `Ok(None)` when the key was never written
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn write(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Read and parse one record
pub async fn read_record<S, T>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.read(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Deserialize {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Like [`read_record`], but any failure is logged and reported as absent
pub async fn read_record_lenient<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match read_record(store, key).await {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", key, e);
            None
        }
    }
}

/// Absent or malformed records fall back to `T::default()`
pub async fn read_record_or_default<S, T>(store: &S, key: &str) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    read_record_lenient(store, key).await.unwrap_or_default()
}

pub async fn write_record<S, T>(store: &S, key: &str, record: &T) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(record).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.write(key, value).await
}

/// In-process store used by tests and as a stand-in outside the browser
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Value>>,
    fail_writes: Cell<bool>,
    write_count: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.entries.borrow_mut().insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.get()
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::Bridge(format!("write to {} rejected", key)));
        }
        self.write_count.set(self.write_count.get() + 1);
        self.insert(key, value);
        Ok(())
    }
}
