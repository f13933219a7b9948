//! Database initialisation against a real file on disk

use marquee_common::db::{
    init_database, insert_movie, list_servers, NewMovie, SettingsStore, SqliteSettingsStore,
    KEY_LOCKER_ENABLED, KEY_TRIGGER_PERCENTAGE,
};

#[tokio::test]
async fn test_init_creates_missing_parent_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("marquee.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists());
    let store = SqliteSettingsStore::new(pool);
    let values = store.get_many(&[KEY_LOCKER_ENABLED]).await.unwrap();
    assert_eq!(values[KEY_LOCKER_ENABLED], "true");
}

#[tokio::test]
async fn test_reopen_keeps_operator_settings() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("marquee.db");

    {
        let pool = init_database(&db_path).await.unwrap();
        SqliteSettingsStore::new(pool.clone())
            .set_many(&[(KEY_TRIGGER_PERCENTAGE, "75".to_string())])
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let store = SqliteSettingsStore::new(pool);
    let values = store.get_many(&[KEY_TRIGGER_PERCENTAGE]).await.unwrap();
    assert_eq!(values[KEY_TRIGGER_PERCENTAGE], "75");
}

#[tokio::test]
async fn test_deleting_movie_cascades_to_servers() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("marquee.db")).await.unwrap();

    let id = insert_movie(
        &pool,
        &NewMovie {
            title: "Metropolis".to_string(),
            slug: "metropolis".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    sqlx::query("INSERT INTO servers (movie_id, name, url) VALUES (?, 'Main', 'https://cdn.example/m.mp4')")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(list_servers(&pool, id).await.unwrap().is_empty());
}
