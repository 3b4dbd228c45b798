use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::{AdminUser, AuthUser};
use crate::auth::password::hash_password;
use crate::error::{ApiError, Envelope};
use crate::pagination::{list_query, ListQuery};
use crate::state::AppState;
use crate::storage::ext_from_mime;

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo::{self, NewUser, Role, UserPatch};

const BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", axum::routing::post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/me", get(read_me).patch(update_me))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

fn required(v: &Option<String>) -> Result<&str, ApiError> {
    match v.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ApiError::malformed()),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Envelope, ApiError> {
    let first_name = required(&payload.first_name)?;
    let last_name = required(&payload.last_name)?;
    let birth_date = required(&payload.birth_date)?;
    let document = required(&payload.document)?;
    let email = required(&payload.email)?.to_lowercase();
    let password = required(&payload.password)?;
    let role_raw = required(&payload.role)?;

    if repo::find_by_email_or_document(&state.db, &email, document)
        .await?
        .is_some()
    {
        return Err(ApiError::duplicate_identity());
    }

    let role = Role::parse(role_raw)
        .ok_or_else(|| ApiError::bad_request("Role must be 'USER' or 'ADMIN'."))?;

    if password.len() < 6 {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters.",
        ));
    }

    let password_hash = hash_password(password)?;

    let id = repo::create(
        &state.db,
        NewUser {
            first_name,
            last_name,
            birth_date,
            document,
            email: &email,
            password_hash: &password_hash,
            role,
            active: true,
            confirmation_token: None,
        },
    )
    .await?;

    info!(user_id = id, role = ?role, admin_id = admin.id, "user created by admin");
    Ok(Envelope::created().with("id", id))
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope, ApiError> {
    let query = list_query(query)?;
    let (limit, offset) = query.limit_offset()?;
    let users = repo::list(&state.db, query.q.as_deref(), limit, offset).await?;
    Ok(Envelope::ok().with("data", users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Envelope::ok().with("data", user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Envelope, ApiError> {
    let patch = UserPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        birth_date: payload.birth_date,
        document: payload.document,
        email: payload.email.map(|e| e.to_lowercase()),
        ..Default::default()
    };

    let rows = repo::update(&state.db, id, patch).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Envelope::ok().with("id", id))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let rows = repo::delete(&state.db, id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    info!(user_id = id, admin_id = admin.id, "user deleted");
    Ok(Envelope::ok().with("id", id))
}

#[instrument(skip(state))]
pub async fn read_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Envelope, ApiError> {
    let user = repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Envelope::ok().with("data", user))
}

/// Multipart so the avatar can ride along with the text fields. Unknown
/// fields (`id`, `role`, timestamps) are dropped on the floor.
#[instrument(skip(state, mp))]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    mut mp: Multipart,
) -> Result<Envelope, ApiError> {
    let mut patch = UserPatch::default();

    while let Some(field) = mp.next_field().await.map_err(|_| ApiError::malformed())? {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "avatar" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|_| ApiError::malformed())?;
                if data.is_empty() {
                    continue;
                }
                let key = format!(
                    "avatars/{}-{}.{}",
                    auth.id,
                    Uuid::new_v4(),
                    ext_from_mime(&content_type)
                );
                let path = state.storage.put_object(&key, data, &content_type).await?;
                patch.avatar = Some(path);
            }
            "password" => {
                let value = field.text().await.map_err(|_| ApiError::malformed())?;
                if !value.is_empty() {
                    patch.password_hash = Some(hash_password(&value)?);
                }
            }
            "firstName" => patch.first_name = non_empty(field).await?,
            "lastName" => patch.last_name = non_empty(field).await?,
            "birthDate" => patch.birth_date = non_empty(field).await?,
            "document" => patch.document = non_empty(field).await?,
            "email" => patch.email = non_empty(field).await?.map(|e| e.to_lowercase()),
            _ => {}
        }
    }

    let rows = repo::update(&state.db, auth.id, patch).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Envelope::ok().with("id", auth.id))
}

async fn non_empty(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<String>, ApiError> {
    let value = field.text().await.map_err(|_| ApiError::malformed())?;
    Ok(if value.is_empty() { None } else { Some(value) })
}
