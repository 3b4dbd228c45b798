use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::{like_pattern, now_rfc3339};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub value: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// List row joined with the rater's first name and the product name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RatingListItem {
    pub id: i64,
    pub value: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(rename = "user_firstName")]
    pub user_first_name: Option<String>,
    pub product_name: Option<String>,
}

const RATING_COLUMNS: &str = "id, value, user_id, product_id, created_at, updated_at";

pub async fn create(
    db: &SqlitePool,
    value: i64,
    user_id: i64,
    product_id: i64,
) -> anyhow::Result<i64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        "INSERT INTO ratings (value, user_id, product_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(value)
    .bind(user_id)
    .bind(product_id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Rating>> {
    let rating = sqlx::query_as::<_, Rating>(&format!(
        "SELECT {RATING_COLUMNS} FROM ratings WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(rating)
}

pub async fn list(
    db: &SqlitePool,
    q: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<RatingListItem>> {
    let pattern = like_pattern(q);
    let rows = sqlx::query_as::<_, RatingListItem>(
        r#"
        SELECT r.id, r.value, r.user_id, r.product_id, r.created_at, r.updated_at,
               u.first_name AS user_first_name, p.name AS product_name
        FROM ratings r
        LEFT JOIN users u ON u.id = r.user_id
        LEFT JOIN products p ON p.id = r.product_id
        WHERE CAST(r.value AS TEXT) LIKE ?1
           OR IFNULL(u.first_name, '') LIKE ?1
           OR IFNULL(p.name, '') LIKE ?1
        ORDER BY r.id
        LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Only the value is mutable; the user and product references are fixed at
/// creation.
pub async fn update(db: &SqlitePool, id: i64, value: Option<i64>) -> anyhow::Result<u64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        "UPDATE ratings SET value = COALESCE(?, value), updated_at = ? WHERE id = ?",
    )
    .bind(value)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM ratings WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM ratings")
        .fetch_one(db)
        .await?;
    Ok(n)
}
