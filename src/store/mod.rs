pub mod json_store;
pub mod schema;

use std::collections::HashMap;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

pub use json_store::JsonStore;
pub use schema::{KEYSTROKE_TRACKING, PREFERENCES, SESSION_HISTORY, Versioned};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
}

/// String key-value persistence. Values are opaque to the store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-process store. Nothing survives the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Load a versioned value, or `None` when it is absent, unreadable, corrupt or
/// from another schema version.
pub fn load<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "could not read stored value");
            return None;
        }
    };
    match serde_json::from_str::<Versioned<T>>(&raw) {
        Ok(envelope) if envelope.needs_reset() => {
            warn!(key, version = envelope.schema_version, "discarding stale stored value");
            None
        }
        Ok(envelope) => Some(envelope.data),
        Err(e) => {
            warn!(key, error = %e, "discarding corrupt stored value");
            None
        }
    }
}

pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    load(store, key).unwrap_or_default()
}

pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string_pretty(&Versioned::new(value)).map_err(|source| {
        StoreError::Encode {
            key: key.to_string(),
            source,
        }
    })?;
    store.set(key, &json)
}
