//! Stage table queries

use leadboard_common::{Result, Stage};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const STAGE_COLUMNS: &str = "id, title, sort_order, description, color, stage_group";

/// Partial stage update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChanges {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub group: Option<String>,
}

impl StageChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.order.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.group.is_none()
    }
}

/// All stages ordered by `order`
pub async fn list_stages(pool: &SqlitePool) -> Result<Vec<Stage>> {
    let stages = sqlx::query_as::<_, Stage>(&format!(
        "SELECT {} FROM stages ORDER BY sort_order ASC",
        STAGE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(stages)
}

pub async fn get_stage(pool: &SqlitePool, id: &str) -> Result<Option<Stage>> {
    let stage = sqlx::query_as::<_, Stage>(&format!(
        "SELECT {} FROM stages WHERE id = ?",
        STAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(stage)
}

pub async fn stage_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM stages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Stage with the lowest `order`
pub async fn first_stage(pool: &SqlitePool) -> Result<Option<Stage>> {
    let stage = sqlx::query_as::<_, Stage>(&format!(
        "SELECT {} FROM stages ORDER BY sort_order ASC LIMIT 1",
        STAGE_COLUMNS
    ))
    .fetch_optional(pool)
    .await?;

    Ok(stage)
}

pub async fn order_taken(pool: &SqlitePool, order: i64, except_id: Option<&str>) -> Result<bool> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM stages WHERE sort_order = ?")
        .bind(order)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some_and(|id| Some(id.as_str()) != except_id))
}

pub async fn insert_stage(pool: &SqlitePool, stage: &Stage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO stages (id, title, sort_order, description, color, stage_group)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&stage.id)
    .bind(&stage.title)
    .bind(stage.order)
    .bind(&stage.description)
    .bind(&stage.color)
    .bind(&stage.group)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns false when no such stage exists
pub async fn update_stage(pool: &SqlitePool, id: &str, changes: &StageChanges) -> Result<bool> {
    if changes.is_empty() {
        return stage_exists(pool, id).await;
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE stages SET ");
    let mut set = qb.separated(", ");
    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title.clone());
    }
    if let Some(order) = changes.order {
        set.push("sort_order = ").push_bind_unseparated(order);
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description.clone());
    }
    if let Some(color) = &changes.color {
        set.push("color = ").push_bind_unseparated(color.clone());
    }
    if let Some(group) = &changes.group {
        set.push("stage_group = ").push_bind_unseparated(group.clone());
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id.to_string());

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when no such stage exists
pub async fn delete_stage(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM stages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadboard_common::db::init_memory_database;

    #[tokio::test]
    async fn test_default_stages_in_order() {
        let pool = init_memory_database().await.unwrap();
        let stages = list_stages(&pool).await.unwrap();

        assert_eq!(stages.len(), 5);
        assert_eq!(stages[0].id, "newLeads");
        assert_eq!(stages[0].order, 1);
        assert_eq!(stages[3].title, "Consultation Ready");
        assert_eq!(stages[4].group.as_deref(), Some("automated"));
        assert_eq!(first_stage(&pool).await.unwrap().unwrap().id, "newLeads");
    }

    #[tokio::test]
    async fn test_partial_update() {
        let pool = init_memory_database().await.unwrap();
        let changes = StageChanges {
            title: Some("Booked".to_string()),
            color: Some("#000000".to_string()),
            ..Default::default()
        };

        assert!(update_stage(&pool, "qualified", &changes).await.unwrap());
        let stage = get_stage(&pool, "qualified").await.unwrap().unwrap();
        assert_eq!(stage.title, "Booked");
        assert_eq!(stage.color.as_deref(), Some("#000000"));
        assert_eq!(stage.order, 4);

        assert!(!update_stage(&pool, "ghost", &changes).await.unwrap());
    }

    #[tokio::test]
    async fn test_order_taken_ignores_self() {
        let pool = init_memory_database().await.unwrap();
        assert!(order_taken(&pool, 2, None).await.unwrap());
        assert!(!order_taken(&pool, 2, Some("pendingSMS")).await.unwrap());
        assert!(!order_taken(&pool, 9, None).await.unwrap());
    }
}
