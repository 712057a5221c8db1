//! Database initialization against real files

use leadboard_common::db::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("leadboard.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leadboard.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE stages SET title = 'Fresh' WHERE id = 'newLeads'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let title: String = sqlx::query_scalar("SELECT title FROM stages WHERE id = 'newLeads'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(title, "Fresh");
    assert_eq!(count, 5);
}

#[tokio::test]
async fn test_stats_row_present_after_init() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("leadboard.db")).await.unwrap();

    let total: i64 = sqlx::query_scalar("SELECT total_leads FROM stats WHERE id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_stage_foreign_key_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("leadboard.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO leads (name, username, stage_id, created_at, updated_at) \
         VALUES ('x', '@x', 'nowhere', '2024-01-01', '2024-01-01')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}
