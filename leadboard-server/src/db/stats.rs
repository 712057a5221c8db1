//! Stats Aggregator
//!
//! Counters are recomputed from the lead table on every read and the
//! snapshot is written back to the singleton `stats` row.

use chrono::{DateTime, Utc};
use leadboard_common::time::start_of_day;
use leadboard_common::{Result, Stats};
use sqlx::SqlitePool;
use tracing::debug;

/// Recompute dashboard counters as of `now`
pub async fn recompute(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Stats> {
    let total_leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
        .fetch_one(pool)
        .await?;

    let new_leads_today: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE created_at >= ?")
        .bind(start_of_day(now))
        .fetch_one(pool)
        .await?;

    let consults_booked: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE consult_date IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let (sent, replied): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(CASE WHEN verified_time IS NOT NULL THEN 1 ELSE 0 END), 0)
        FROM leads
        WHERE send_time IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    let stats = Stats {
        total_leads,
        new_leads_today,
        consults_booked,
        sms_response_rate: response_rate(sent, replied),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stats (id, total_leads, new_leads_today, consults_booked, sms_response_rate, updated_at)
        VALUES (1, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            total_leads = excluded.total_leads,
            new_leads_today = excluded.new_leads_today,
            consults_booked = excluded.consults_booked,
            sms_response_rate = excluded.sms_response_rate,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(stats.total_leads)
    .bind(stats.new_leads_today)
    .bind(stats.consults_booked)
    .bind(stats.sms_response_rate)
    .bind(stats.updated_at)
    .execute(pool)
    .await?;

    debug!(total = stats.total_leads, today = stats.new_leads_today, "Stats recomputed");
    Ok(stats)
}

/// Rounded percentage of sent messages that were answered
fn response_rate(sent: i64, replied: i64) -> i64 {
    if sent == 0 {
        return 0;
    }
    ((replied as f64 / sent as f64) * 100.0).round() as i64
}
