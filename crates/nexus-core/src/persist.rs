//! Key-value persistence port and the JSON layout of the records kept in it.
//!
//! Agents and saved searches are stored as JSON arrays under fixed keys.
//! Loading is element-wise: an entry that no longer parses is skipped and
//! counted instead of poisoning the whole list.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::agent::Agent;
use crate::filter::SavedSearch;

pub const AGENTS_KEY: &str = "agents";
pub const SAVED_SEARCHES_KEY: &str = "saved_searches";

/// String key-value storage, decoupled from any storage technology.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for &K {
    type Error = K::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("store backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PersistError {
    fn backend<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Backend(Box::new(e))
    }
}

/// Records decoded from a key plus the number of entries that were dropped.
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Infallible> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Infallible> {
        self.entries().remove(key);
        Ok(())
    }
}

fn load_list<K, T>(
    store: &K,
    key: &str,
    decode: impl Fn(serde_json::Value) -> Option<T>,
) -> Result<Loaded<T>, PersistError>
where
    K: KeyValueStore,
{
    let Some(raw) = store.get(key).map_err(PersistError::backend)? else {
        return Ok(Loaded {
            items: Vec::new(),
            skipped: 0,
        });
    };

    let values = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Array(values)) => values,
        _ => {
            return Ok(Loaded {
                items: Vec::new(),
                skipped: 1,
            });
        }
    };

    let total = values.len();
    let items: Vec<T> = values.into_iter().filter_map(decode).collect();
    Ok(Loaded {
        skipped: total - items.len(),
        items,
    })
}

fn save_list<K: KeyValueStore, T: Serialize>(
    store: &K,
    key: &str,
    items: &[T],
) -> Result<(), PersistError> {
    let json = serde_json::to_string(items)?;
    store.set(key, &json).map_err(PersistError::backend)
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

pub fn load_agents<K: KeyValueStore>(store: &K) -> Result<Loaded<Agent>, PersistError> {
    load_list(store, AGENTS_KEY, decode::<Agent>)
}

pub fn save_agents<K: KeyValueStore>(store: &K, agents: &[Agent]) -> Result<(), PersistError> {
    save_list(store, AGENTS_KEY, agents)
}

pub fn load_saved_searches<K: KeyValueStore>(
    store: &K,
) -> Result<Loaded<SavedSearch>, PersistError> {
    load_list(store, SAVED_SEARCHES_KEY, SavedSearch::from_json_value)
}

/// Append a snapshot. Snapshots are never rewritten, only added or deleted.
pub fn add_saved_search<K: KeyValueStore>(
    store: &K,
    search: &SavedSearch,
) -> Result<(), PersistError> {
    let mut searches = load_saved_searches(store)?.items;
    searches.push(search.clone());
    save_list(store, SAVED_SEARCHES_KEY, &searches)
}

/// Returns whether a snapshot with that id existed.
pub fn delete_saved_search<K: KeyValueStore>(store: &K, id: Uuid) -> Result<bool, PersistError> {
    let mut searches = load_saved_searches(store)?.items;
    let before = searches.len();
    searches.retain(|s| s.id != id);
    if searches.len() == before {
        return Ok(false);
    }
    save_list(store, SAVED_SEARCHES_KEY, &searches)?;
    Ok(true)
}
