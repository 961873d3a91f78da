use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use crate::config::StoreConfig;
use crate::entry::{now_nanos, Entry, Ttl};
use crate::error::{CacheError, Result};
use crate::sweeper::Sweeper;
use crate::value::Value;

/// Internal shared state for the store
pub(crate) struct StoreInner {
    pub(crate) items: RwLock<HashMap<String, Entry>>,
    default_ttl: Option<Duration>,
    autosave_path: Option<PathBuf>,
}

impl StoreInner {
    fn delete_expired_at(&self, now: i64) -> usize {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired_at(now));
        before - items.len()
    }
}

/// Thread-safe in-memory key-value store with TTL support
///
/// All entries live in one map behind a reader/writer lock. Reads take the
/// shared lock and never block each other; every mutation takes the
/// exclusive lock for its whole critical section, so `add` and `replace`
/// check and write atomically.
///
/// Each store spawns its own background sweeper that periodically removes
/// expired entries. The sweeper stops on [`Store::stop_sweeper`] or when
/// the last handle to the store is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use ttlcache_core::{Store, Ttl};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     // 30 minute default TTL, sweep every 3 seconds
///     let store = Store::new(Duration::from_secs(1800), Duration::from_secs(3));
///
///     store.set("k1", "hello world", Duration::from_secs(5));
///     store.set("k2", 42, Ttl::Never);
///     store.add("k3", "uses the default TTL", Ttl::Default).unwrap();
///
///     assert!(store.get("k1").is_some());
/// }
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    sweeper: Option<Arc<Sweeper>>,
}

impl Store {
    /// Creates a store with the given default TTL and sweep interval.
    ///
    /// A zero `default_ttl` makes `Ttl::Default` writes never expire; a zero
    /// `sweep_interval` disables the background sweeper.
    ///
    /// # Panics
    ///
    /// Panics if the sweeper is enabled and this is called outside of a
    /// Tokio runtime context.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self::with_config(
            StoreConfig::default()
                .with_default_ttl(default_ttl)
                .with_sweep_interval(sweep_interval),
        )
    }

    /// Creates a new store with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if `config.sweep_interval` is set and this is called outside
    /// of a Tokio runtime context.
    pub fn with_config(config: StoreConfig) -> Self {
        let inner = Arc::new(StoreInner {
            items: RwLock::new(HashMap::new()),
            default_ttl: config.default_ttl,
            autosave_path: config.autosave_path,
        });

        let sweeper = config
            .sweep_interval
            .filter(|interval| !interval.is_zero())
            .map(|interval| Arc::new(Self::spawn_sweeper(Arc::downgrade(&inner), interval)));

        Self { inner, sweeper }
    }

    /// The sweeper only holds a weak reference, so it never keeps the map alive.
    fn spawn_sweeper(inner: Weak<StoreInner>, interval: Duration) -> Sweeper {
        Sweeper::spawn(interval, move || {
            let Some(inner) = inner.upgrade() else {
                return false;
            };
            let removed = inner.delete_expired_at(now_nanos());
            if removed > 0 {
                tracing::debug!(removed, "swept expired entries");
            }
            true
        })
    }

    pub(crate) fn inner(&self) -> &StoreInner {
        &self.inner
    }

    /// Stores a value, overwriting any existing entry for the key.
    ///
    /// # TTL Semantics
    ///
    /// - `Ttl::Never` stores the entry until it is deleted or overwritten.
    /// - `Ttl::Default` applies the store's default TTL.
    /// - `Ttl::After(d)` (or a plain `Duration`) expires `d` after now.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>, ttl: impl Into<Ttl>) {
        let entry = self.new_entry(value.into(), ttl.into());
        self.inner.items.write().insert(key.into(), entry);
        self.autosave();
    }

    /// Stores a value only if no live entry exists for the key.
    ///
    /// An expired entry that has not been swept yet counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::AlreadyExists` if a non-expired entry is present.
    pub fn add(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        ttl: impl Into<Ttl>,
    ) -> Result<()> {
        let key = key.into();
        let entry = self.new_entry(value.into(), ttl.into());
        {
            let mut items = self.inner.items.write();
            if Self::live(&items, &key, now_nanos()).is_some() {
                return Err(CacheError::AlreadyExists { key });
            }
            items.insert(key, entry);
        }
        self.autosave();
        Ok(())
    }

    /// Overwrites a value only if a live entry exists for the key.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NotFound` if the key is absent or expired.
    pub fn replace(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        ttl: impl Into<Ttl>,
    ) -> Result<()> {
        let key = key.into();
        let entry = self.new_entry(value.into(), ttl.into());
        {
            let mut items = self.inner.items.write();
            if Self::live(&items, &key, now_nanos()).is_none() {
                return Err(CacheError::NotFound { key });
            }
            items.insert(key, entry);
        }
        self.autosave();
        Ok(())
    }

    /// Retrieves a value by key
    ///
    /// Returns `None` if the key doesn't exist or has expired. Expired
    /// entries are left in place for the sweeper.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, now_nanos())
    }

    /// Like [`Store::get`], evaluated at `now` (Unix nanoseconds)
    pub fn get_at(&self, key: &str, now: i64) -> Option<Value> {
        let items = self.inner.items.read();
        Self::live(&items, key, now).map(|entry| entry.value().clone())
    }

    /// Retrieves a value together with its expiration time (`None` = never)
    pub fn get_with_expiration(&self, key: &str) -> Option<(Value, Option<SystemTime>)> {
        let items = self.inner.items.read();
        Self::live(&items, key, now_nanos())
            .map(|entry| (entry.value().clone(), entry.expiration_time()))
    }

    /// Checks if a key exists and is not expired.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let items = self.inner.items.read();
        Self::live(&items, key, now_nanos()).is_some()
    }

    /// Deletes a key from the store
    ///
    /// Returns `true` if the key existed (regardless of expiration), `false` otherwise.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.items.write().remove(key).is_some()
    }

    /// Removes every expired entry and returns how many were removed.
    ///
    /// Holds the exclusive lock for the whole scan. This is also done
    /// automatically by the sweeper.
    pub fn delete_expired(&self) -> usize {
        self.delete_expired_at(now_nanos())
    }

    /// Like [`Store::delete_expired`], evaluated at `now` (Unix nanoseconds)
    pub fn delete_expired_at(&self, now: i64) -> usize {
        self.inner.delete_expired_at(now)
    }

    /// Returns every non-expired `(key, value)` pair, in no particular order
    pub fn all(&self) -> Vec<(String, Value)> {
        let now = now_nanos();
        self.inner
            .items
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.value().clone()))
            .collect()
    }

    /// Returns all keys that are not expired
    pub fn keys(&self) -> Vec<String> {
        let now = now_nanos();
        self.inner
            .items
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns the number of entries in the store (including expired ones not yet swept)
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    /// Returns `true` if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Stops the background sweeper.
    ///
    /// Returns `true` if this call stopped it, `false` if it was already
    /// stopped or the store was built without one. Safe to call any number
    /// of times, from any clone.
    pub fn stop_sweeper(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|sweeper| sweeper.stop())
    }

    /// Returns `true` while the background sweeper task is alive
    pub fn sweeper_running(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|sweeper| sweeper.is_running())
    }

    fn new_entry(&self, value: Value, ttl: Ttl) -> Entry {
        Entry::new(value, ttl.expires_at(self.inner.default_ttl, now_nanos()))
    }

    fn live<'a>(items: &'a HashMap<String, Entry>, key: &str, now: i64) -> Option<&'a Entry> {
        items.get(key).filter(|entry| !entry.is_expired_at(now))
    }

    /// Legacy write-through persistence; failures are logged, never returned.
    fn autosave(&self) {
        if let Some(path) = &self.inner.autosave_path {
            if let Err(e) = self.save_to_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "autosave failed");
            }
        }
    }

    /// Inserts a prepared entry directly (for testing purposes)
    #[cfg(test)]
    pub(crate) fn insert_entry(&self, key: impl Into<String>, entry: Entry) {
        self.inner.items.write().insert(key.into(), entry);
    }
}
