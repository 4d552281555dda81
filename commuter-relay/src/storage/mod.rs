//! Key/value persistence.
//!
//! The relay persists its session (current route, departure identifiers,
//! station cache, favorites, schedules and language) as JSON-encoded
//! strings under fixed keys, so a detail request or the favorites list
//! survive a restart.

mod error;
mod file;
mod session;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub use error::StorageError;
pub use file::JsonFileStore;
pub use session::SessionStore;

/// Storage keys.
pub mod keys {
    pub const FROM_STATION: &str = "nmbs_from_station";
    pub const TO_STATION: &str = "nmbs_to_station";
    pub const CONNECTIONS: &str = "nmbs_connections";
    pub const STATION_CACHE: &str = "nmbs_station_cache";
    pub const FAVORITE_STATIONS: &str = "nmbs_favorite_stations";
    pub const SMART_SCHEDULES: &str = "nmbs_smart_schedules";
    pub const LANGUAGE: &str = "nmbs_language";
}

/// String key/value persistence.
pub trait KeyValueStore: Send + Sync {
    /// The value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.as_ref().set(key, value)
    }
}

/// In-memory store, for tests and for running without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}
