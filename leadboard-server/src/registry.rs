//! Pipeline Stage Registry
//!
//! Authority on which stages exist and in what order. There is no
//! transition graph: a lead may move to any existing stage.

use crate::db::leads::count_leads_in_stage;
use crate::db::stages::{self, StageChanges};
use leadboard_common::{Error, Result, Stage};
use sqlx::SqlitePool;
use tracing::info;

pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    stages::stage_exists(pool, id).await
}

/// Stages sorted by `order`
pub async fn list(pool: &SqlitePool) -> Result<Vec<Stage>> {
    stages::list_stages(pool).await
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Stage> {
    stages::get_stage(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Stage '{}' not found", id)))
}

/// Stage new leads land in when none is given
pub async fn entry_stage(pool: &SqlitePool) -> Result<Stage> {
    stages::first_stage(pool)
        .await?
        .ok_or_else(|| Error::Internal("No pipeline stages configured".to_string()))
}

/// Fail with `NotFound` unless `id` is a known stage
pub async fn require(pool: &SqlitePool, id: &str) -> Result<()> {
    if exists(pool, id).await? {
        Ok(())
    } else {
        Err(Error::NotFound(format!("Stage '{}' not found", id)))
    }
}

pub async fn create(pool: &SqlitePool, stage: Stage) -> Result<Stage> {
    if stage.id.trim().is_empty() {
        return Err(Error::validation("id", "stage id must not be empty"));
    }
    if stage.title.trim().is_empty() {
        return Err(Error::validation("title", "stage title must not be empty"));
    }
    if exists(pool, &stage.id).await? {
        return Err(Error::Conflict(format!("Stage '{}' already exists", stage.id)));
    }
    if stages::order_taken(pool, stage.order, None).await? {
        return Err(Error::Conflict(format!(
            "Another stage already has order {}",
            stage.order
        )));
    }

    stages::insert_stage(pool, &stage).await?;
    info!(stage_id = %stage.id, order = stage.order, "Created stage");
    Ok(stage)
}

pub async fn update(pool: &SqlitePool, id: &str, changes: StageChanges) -> Result<Stage> {
    if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Error::validation("title", "stage title must not be empty"));
    }
    if let Some(order) = changes.order {
        if stages::order_taken(pool, order, Some(id)).await? {
            return Err(Error::Conflict(format!(
                "Another stage already has order {}",
                order
            )));
        }
    }

    if !stages::update_stage(pool, id, &changes).await? {
        return Err(Error::NotFound(format!("Stage '{}' not found", id)));
    }

    info!(stage_id = %id, "Updated stage");
    get(pool, id).await
}

/// Remove a stage; refused while any lead is in it
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    require(pool, id).await?;

    let occupants = count_leads_in_stage(pool, id).await?;
    if occupants > 0 {
        return Err(Error::Conflict(format!(
            "Stage '{}' still holds {} lead(s)",
            id, occupants
        )));
    }

    stages::delete_stage(pool, id).await?;
    info!(stage_id = %id, "Deleted stage");
    Ok(())
}
