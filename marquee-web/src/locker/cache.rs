//! Time-bounded cache of locker settings
//!
//! The refresh runs while holding the cache lock, so callers arriving during
//! a cold or expired cache wait for the one fetch in flight instead of
//! issuing their own.

use chrono::{DateTime, Duration, Utc};
use marquee_common::db::{locker_setting_keys, SettingsStore};
use marquee_common::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::settings::LockerSettings;

#[derive(Debug, Clone)]
struct CachedSettings {
    value: LockerSettings,
    expires_at: DateTime<Utc>,
}

/// Locker settings cache over a [`SettingsStore`]
pub struct SettingsCache {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<CachedSettings>>,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Current settings, refreshing from the store when expired.
    ///
    /// A store failure yields the defaults and is not cached, so the next
    /// call retries.
    pub async fn get(&self) -> LockerSettings {
        let mut entry = self.entry.lock().await;

        let now = self.clock.now();
        if let Some(cached) = entry.as_ref() {
            if now < cached.expires_at {
                return cached.value.clone();
            }
        }

        let keys = locker_setting_keys();
        match self.store.get_many(&keys).await {
            Ok(values) => {
                let value = LockerSettings::from_values(&values);
                debug!("Locker settings refreshed (ttl {}s)", self.ttl.num_seconds());
                *entry = Some(CachedSettings {
                    value: value.clone(),
                    expires_at: now + self.ttl,
                });
                value
            }
            Err(e) => {
                warn!("Failed to load locker settings: {}, using defaults", e);
                LockerSettings::default()
            }
        }
    }

    /// Drop the cached value so the next `get` reads the store
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}

impl std::fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use marquee_common::db::{KEY_LOCKER_ENABLED, KEY_TRIGGER_PERCENTAGE};
    use marquee_common::{Error, ManualClock, Result};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// In-memory store counting fetches, optionally failing or slow
    #[derive(Default)]
    struct CountingStore {
        values: StdMutex<HashMap<String, String>>,
        fetches: AtomicUsize,
        fail: AtomicBool,
        delay_ms: u64,
    }

    impl CountingStore {
        fn with(pairs: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (k, v) in pairs {
                store.put(k, v);
            }
            store
        }

        fn put(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SettingsStore for CountingStore {
        async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            let values = self.values.lock().unwrap();
            Ok(keys
                .iter()
                .filter_map(|k| values.get(*k).map(|v| (k.to_string(), v.clone())))
                .collect())
        }

        async fn set_many(&self, pairs: &[(&str, String)]) -> Result<()> {
            for (key, value) in pairs {
                self.put(key, value);
            }
            Ok(())
        }
    }

    fn cache(store: Arc<CountingStore>, clock: Arc<ManualClock>) -> SettingsCache {
        SettingsCache::new(store, clock, Duration::seconds(60))
    }

    #[tokio::test]
    async fn test_serves_cached_value_until_expiry() {
        let store = Arc::new(CountingStore::with(&[(KEY_TRIGGER_PERCENTAGE, "40")]));
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock.clone());

        assert_eq!(cache.get().await.trigger_percentage, 40.0);
        store.put(KEY_TRIGGER_PERCENTAGE, "70");

        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get().await.trigger_percentage, 40.0);
        assert_eq!(store.fetches(), 1);

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get().await.trigger_percentage, 70.0);
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_defaults_and_is_not_cached() {
        let store = Arc::new(CountingStore::with(&[(KEY_LOCKER_ENABLED, "false")]));
        store.fail.store(true, Ordering::SeqCst);
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);

        assert_eq!(cache.get().await, LockerSettings::default());

        store.fail.store(false, Ordering::SeqCst);
        assert!(!cache.get().await.enabled);
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let store = Arc::new(CountingStore::with(&[(KEY_TRIGGER_PERCENTAGE, "10")]));
        let cache = cache(store.clone(), Arc::new(ManualClock::default()));

        cache.get().await;
        store.put(KEY_TRIGGER_PERCENTAGE, "90");
        cache.invalidate().await;

        assert_eq!(cache.get().await.trigger_percentage, 90.0);
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_cold_callers_share_one_fetch() {
        let store = Arc::new(CountingStore {
            delay_ms: 50,
            ..CountingStore::with(&[(KEY_TRIGGER_PERCENTAGE, "33")])
        });
        let cache = Arc::new(cache(store.clone(), Arc::new(ManualClock::default())));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().trigger_percentage, 33.0);
        }

        assert_eq!(store.fetches(), 1);
    }
}
