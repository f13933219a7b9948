//! Settings key-value store
//!
//! All values are stored as strings. Consumers parse them and fall back to the
//! defaults below when a key is missing or malformed.

use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;

pub const KEY_LOCKER_ENABLED: &str = "locker_enabled";
pub const KEY_TRIGGER_PERCENTAGE: &str = "trigger_percentage";
pub const KEY_ONLY_DIRECT_VIDEOS: &str = "only_direct_videos";
pub const KEY_SKIP_IF_NO_DURATION: &str = "skip_if_no_duration";
pub const KEY_MIN_DURATION: &str = "min_duration";
pub const KEY_LOCKER_WIDTH: &str = "locker_width";
pub const KEY_LOCKER_HEIGHT: &str = "locker_height";
pub const KEY_LOCKER_BACKDROP_OPACITY: &str = "locker_backdrop_opacity";
pub const KEY_LOCKER_HTML: &str = "locker_html";

/// Every locker key with its default value
pub const LOCKER_SETTING_DEFAULTS: &[(&str, &str)] = &[
    (KEY_LOCKER_ENABLED, "true"),
    (KEY_TRIGGER_PERCENTAGE, "20"),
    (KEY_ONLY_DIRECT_VIDEOS, "false"),
    (KEY_SKIP_IF_NO_DURATION, "false"),
    (KEY_MIN_DURATION, "0"),
    (KEY_LOCKER_WIDTH, "640"),
    (KEY_LOCKER_HEIGHT, "480"),
    (KEY_LOCKER_BACKDROP_OPACITY, "0.85"),
    (KEY_LOCKER_HTML, ""),
];

/// Keys read by the locker
pub fn locker_setting_keys() -> Vec<&'static str> {
    LOCKER_SETTING_DEFAULTS.iter().map(|(k, _)| *k).collect()
}

/// Read/write access to the settings table
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Values for several keys. Absent keys are omitted from the map.
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Insert or replace every pair, all or none
    async fn set_many(&self, pairs: &[(&str, String)]) -> Result<()>;
}

/// `SettingsStore` over the SQLite `settings` table
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const UPSERT_SETTING: &str = r#"
    INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
"#;

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT key, value FROM settings WHERE value IS NOT NULL AND key IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, (String, String)>(&sql);
        for key in keys {
            query = query.bind(*key);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    async fn set_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(UPSERT_SETTING)
                .bind(*key)
                .bind(value.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    async fn reject_percentage_writes(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TRIGGER reject_percentage BEFORE UPDATE ON settings
            WHEN NEW.key = 'trigger_percentage'
            BEGIN SELECT RAISE(ABORT, 'trigger_percentage is read-only'); END
            "#,
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_many_returns_seeded_defaults() {
        let store = SqliteSettingsStore::new(init_memory_database().await.unwrap());
        let values = store.get_many(&locker_setting_keys()).await.unwrap();

        assert_eq!(values.len(), LOCKER_SETTING_DEFAULTS.len());
        assert_eq!(values[KEY_TRIGGER_PERCENTAGE], "20");
    }

    #[tokio::test]
    async fn test_set_many_overwrites_and_get_many_filters() {
        let store = SqliteSettingsStore::new(init_memory_database().await.unwrap());
        store
            .set_many(&[
                (KEY_LOCKER_ENABLED, "false".to_string()),
                ("custom_key", "x".to_string()),
            ])
            .await
            .unwrap();

        let values = store
            .get_many(&[KEY_LOCKER_ENABLED, "custom_key", "missing"])
            .await
            .unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[KEY_LOCKER_ENABLED], "false");
        assert_eq!(values["custom_key"], "x");
    }

    #[tokio::test]
    async fn test_set_many_failure_writes_nothing() {
        let pool = init_memory_database().await.unwrap();
        reject_percentage_writes(&pool).await;
        let store = SqliteSettingsStore::new(pool);

        let result = store
            .set_many(&[
                (KEY_LOCKER_ENABLED, "false".to_string()),
                (KEY_TRIGGER_PERCENTAGE, "50".to_string()),
            ])
            .await;
        assert!(result.is_err());

        let values = store
            .get_many(&[KEY_LOCKER_ENABLED, KEY_TRIGGER_PERCENTAGE])
            .await
            .unwrap();
        assert_eq!(values[KEY_LOCKER_ENABLED], "true");
        assert_eq!(values[KEY_TRIGGER_PERCENTAGE], "20");
    }

    #[tokio::test]
    async fn test_get_many_empty_keys() {
        let store = SqliteSettingsStore::new(init_memory_database().await.unwrap());
        assert!(store.get_many(&[]).await.unwrap().is_empty());
    }
}
