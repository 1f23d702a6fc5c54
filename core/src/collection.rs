use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::store::{KeyValueStore, load_json, save_json};

/// A JSON array persisted under one key, with the in-memory copy as the
/// single source of truth between writes.
///
/// Every read-modify-write holds the cache lock across the store write, so
/// two writers on the same key are serialized instead of racing. The cache is
/// only replaced once the store accepted the new value.
pub(crate) struct Collection<T> {
    key: &'static str,
    store: Arc<dyn KeyValueStore>,
    cache: Mutex<Option<Vec<T>>>,
}

impl<T> Collection<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            key,
            store,
            cache: Mutex::new(None),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Vec<T>>>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("Cache lock for '{}' poisoned", self.key))
    }

    fn read(&self) -> Result<Option<Vec<T>>> {
        load_json(self.store.as_ref(), self.key).inspect_err(|e| {
            warn!(key = self.key, "Failed to load: {e:#}");
        })
    }

    fn write(&self, items: &[T]) -> Result<()> {
        save_json(self.store.as_ref(), self.key, items).inspect_err(|e| {
            warn!(key = self.key, "Failed to persist: {e:#}");
        })
    }

    /// Re-read the key from storage and let `normalize` fix up the raw value.
    /// `normalize` receives `None` when the key is absent and returns the
    /// list to keep plus whether it must be written back.
    pub(crate) fn load_with<F>(&self, normalize: F) -> Result<Vec<T>>
    where
        F: FnOnce(Option<Vec<T>>) -> (Vec<T>, bool),
    {
        let mut cache = self.lock()?;
        let raw = self.read()?;
        let (items, dirty) = normalize(raw);
        if dirty {
            self.write(&items)?;
        }
        debug!(key = self.key, count = items.len(), "Loaded collection");
        *cache = Some(items.clone());
        Ok(items)
    }

    /// Current contents, loading from storage on first use.
    pub(crate) fn items(&self) -> Result<Vec<T>> {
        let mut cache = self.lock()?;
        if let Some(items) = cache.as_ref() {
            return Ok(items.clone());
        }
        let items = self.read()?.unwrap_or_default();
        *cache = Some(items.clone());
        Ok(items)
    }

    /// Apply `f` to a working copy. When `f` reports a change the copy is
    /// persisted and becomes the cached value; on any error the cache is left
    /// untouched.
    pub(crate) fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<(R, bool)>,
    {
        let mut cache = self.lock()?;
        let mut working = match cache.as_ref() {
            Some(items) => items.clone(),
            None => self.read()?.unwrap_or_default(),
        };
        let (result, changed) = f(&mut working)?;
        if changed {
            self.write(&working)?;
            debug!(key = self.key, count = working.len(), "Persisted collection");
        }
        *cache = Some(working);
        Ok(result)
    }

    /// Drop the key from storage; the cache becomes empty.
    pub(crate) fn clear(&self) -> Result<()> {
        let mut cache = self.lock()?;
        self.store.remove(self.key).inspect_err(|e| {
            warn!(key = self.key, "Failed to remove: {e:#}");
        })?;
        *cache = Some(Vec::new());
        Ok(())
    }

    /// Forget the cached copy so the next access re-reads storage.
    pub(crate) fn invalidate(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
