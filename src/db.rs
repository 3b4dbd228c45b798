use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

pub async fn init_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("connect to database")?;

    // WAL keeps concurrent readers from blocking on writers.
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;

    info!("database pool ready at {}", database_url);
    Ok(pool)
}

/// Timestamps are stored as RFC 3339 TEXT, written by the application.
pub fn now_rfc3339() -> anyhow::Result<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

/// LIKE pattern for the loose substring filters. No filter matches everything.
pub fn like_pattern(q: Option<&str>) -> String {
    match q {
        Some(q) if !q.is_empty() => format!("%{q}%"),
        _ => "%".into(),
    }
}
