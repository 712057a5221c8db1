//! Lead Record Store
//!
//! Persists leads keyed by numeric id. Writes are built from a
//! [`LeadPatch`], so only allow-listed columns can appear in SQL.

use chrono::{DateTime, Utc};
use leadboard_common::fields::{ColumnValue, LeadPatch, LeadRecord};
use leadboard_common::{Lead, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: ColumnValue) {
    match value {
        ColumnValue::Text(v) => qb.push_bind(v),
        ColumnValue::Integer(v) => qb.push_bind(v),
        ColumnValue::Bool(v) => qb.push_bind(v),
        ColumnValue::Timestamp(v) => qb.push_bind(v),
    };
}

pub async fn get_lead(pool: &SqlitePool, id: i64) -> Result<Option<Lead>> {
    let record = sqlx::query_as::<_, LeadRecord>("SELECT * FROM leads WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(record.map(Lead::from))
}

/// All leads, newest first
pub async fn list_leads(pool: &SqlitePool) -> Result<Vec<Lead>> {
    let records =
        sqlx::query_as::<_, LeadRecord>("SELECT * FROM leads ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await?;

    Ok(records.into_iter().map(Lead::from).collect())
}

/// Leads in one stage, newest first
pub async fn list_leads_by_stage(pool: &SqlitePool, stage_id: &str) -> Result<Vec<Lead>> {
    let records = sqlx::query_as::<_, LeadRecord>(
        "SELECT * FROM leads WHERE stage_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(stage_id)
    .fetch_all(pool)
    .await?;

    Ok(records.into_iter().map(Lead::from).collect())
}

pub async fn count_leads_in_stage(pool: &SqlitePool, stage_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE stage_id = ?")
        .bind(stage_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Insert a new lead, returning its id
///
/// Columns absent from `patch` take their table defaults.
pub async fn insert_lead(pool: &SqlitePool, patch: &LeadPatch, now: DateTime<Utc>) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO leads (");
    for (field, _) in patch.iter() {
        qb.push(field.column());
        qb.push(", ");
    }
    qb.push("created_at, updated_at) VALUES (");
    for (_, value) in patch.iter() {
        push_value(&mut qb, value.encode()?);
        qb.push(", ");
    }
    qb.push_bind(now);
    qb.push(", ");
    qb.push_bind(now);
    qb.push(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.last_insert_rowid())
}

/// Apply `patch` to lead `id` in one statement, bumping `updated_at`
///
/// Returns false when no such lead exists.
pub async fn update_lead(
    pool: &SqlitePool,
    id: i64,
    patch: &LeadPatch,
    now: DateTime<Utc>,
) -> Result<bool> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE leads SET ");
    for (field, value) in patch.iter() {
        qb.push(field.column());
        qb.push(" = ");
        push_value(&mut qb, value.encode()?);
        qb.push(", ");
    }
    qb.push("updated_at = ");
    qb.push_bind(now);
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when no such lead exists
pub async fn delete_lead(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM leads WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
