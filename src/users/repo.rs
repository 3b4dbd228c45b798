use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::{like_pattern, now_rfc3339};

/// Account role. Matched exhaustively at the guard boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// User record. Password hash and confirmation token never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    pub document: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub birth_date: &'a str,
    pub document: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub active: bool,
    pub confirmation_token: Option<&'a str>,
}

/// Partial update. Fields absent here (`id`, `created_at`, `updated_at`,
/// `role`) cannot be changed through the API; password changes only flow in
/// from the self-service route, which is the only caller setting
/// `password_hash`.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str = "id, first_name, last_name, birth_date, document, email, \
     password_hash, role, active, confirmation_token, avatar, created_at, updated_at";

pub async fn create(db: &SqlitePool, user: NewUser<'_>) -> anyhow::Result<i64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        r#"
        INSERT INTO users
            (first_name, last_name, birth_date, document, email, password_hash,
             role, active, confirmation_token, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.birth_date)
    .bind(user.document)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.active)
    .bind(user.confirmation_token)
    .bind(now)
    .execute(db)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_email_or_document(
    db: &SqlitePool,
    email: &str,
    document: &str,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? OR document = ?"
    ))
    .bind(email)
    .bind(document)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_confirmation_token(
    db: &SqlitePool,
    token: &str,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE confirmation_token = ?"
    ))
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn list(
    db: &SqlitePool,
    q: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<User>> {
    let pattern = like_pattern(q);
    let rows = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR email LIKE ?1
        ORDER BY id
        LIMIT ?2 OFFSET ?3
        "#
    ))
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn update(db: &SqlitePool, id: i64, patch: UserPatch) -> anyhow::Result<u64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        r#"
        UPDATE users SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            birth_date = COALESCE(?, birth_date),
            document = COALESCE(?, document),
            email = COALESCE(?, email),
            avatar = COALESCE(?, avatar),
            password_hash = COALESCE(?, password_hash),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.first_name)
    .bind(patch.last_name)
    .bind(patch.birth_date)
    .bind(patch.document)
    .bind(patch.email)
    .bind(patch.avatar)
    .bind(patch.password_hash)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

/// Flips `active` exactly once; the confirmation token is kept on the row.
pub async fn activate(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
    let now = now_rfc3339()?;
    let res = sqlx::query("UPDATE users SET active = 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_by_role(db: &SqlitePool, role: Role) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM users WHERE role = ?")
        .bind(role)
        .fetch_one(db)
        .await?;
    Ok(n)
}
