//! Database initialization
//!
//! Creates the database file on first run, applies pragmas, creates the
//! `stages`, `leads` and `stats` tables, and seeds the default pipeline.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Default pipeline: (id, title, order, description, color)
pub const DEFAULT_STAGES: [(&str, &str, i64, &str, &str); 5] = [
    ("newLeads", "New Leads", 1, "Newly captured leads awaiting outreach", "#3b82f6"),
    ("pendingSMS", "SMS Sent", 2, "Verification text sent, awaiting reply", "#f59e0b"),
    ("verified", "Identity Verified", 3, "Lead confirmed their contact details", "#10b981"),
    ("qualified", "Consultation Ready", 4, "Qualified and ready to book a consult", "#8b5cf6"),
    ("failed", "Failed Verification", 5, "Could not be verified", "#ef4444"),
];

pub const DEFAULT_STAGE_GROUP: &str = "automated";

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool
/// is capped at one connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and seed defaults (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_stages_table(pool).await?;
    create_leads_table(pool).await?;
    create_stats_table(pool).await?;

    seed_default_stages(pool).await?;

    Ok(())
}

async fn create_stages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stages (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            sort_order INTEGER NOT NULL UNIQUE,
            description TEXT,
            color TEXT,
            stage_group TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_leads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            username TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT '',
            avatar TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            stage_id TEXT NOT NULL REFERENCES stages(id),
            questionnaire TEXT NOT NULL DEFAULT '{}',
            assessment TEXT NOT NULL DEFAULT '"Pending"',
            contact_info TEXT,
            sms_status TEXT,
            send_time TIMESTAMP,
            verified_time TIMESTAMP,
            consult_date TIMESTAMP,
            follow_up_date TIMESTAMP,
            call_scheduled INTEGER NOT NULL DEFAULT 0,
            call_notes TEXT,
            score INTEGER,
            qual_score INTEGER,
            priority TEXT,
            financing TEXT,
            reason TEXT,
            notes TEXT,
            inbox_link TEXT,
            summary TEXT,
            age TEXT,
            height TEXT,
            weight TEXT,
            location TEXT,
            health_insurance TEXT,
            service_timeframe TEXT,
            demographic TEXT,
            message_history TEXT,
            convo_history TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_stage_id ON leads(stage_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stats (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            total_leads INTEGER NOT NULL DEFAULT 0,
            new_leads_today INTEGER NOT NULL DEFAULT 0,
            consults_booked INTEGER NOT NULL DEFAULT 0,
            sms_response_rate INTEGER NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO stats (id) VALUES (1)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Seed the default pipeline when no stages exist
///
/// A customised pipeline is never touched.
async fn seed_default_stages(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        debug!(count, "Stages already present, skipping seed");
        return Ok(());
    }

    for (id, title, order, description, color) in DEFAULT_STAGES {
        sqlx::query(
            r#"
            INSERT INTO stages (id, title, sort_order, description, color, stage_group)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(order)
        .bind(description)
        .bind(color)
        .bind(DEFAULT_STAGE_GROUP)
        .execute(pool)
        .await?;
    }

    info!("Seeded {} default pipeline stages", DEFAULT_STAGES.len());
    Ok(())
}
