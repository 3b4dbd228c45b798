//! Access guards. Both extractors run the same state machine: bearer token →
//! decoded claims → identity re-resolved from storage → role check. The
//! storage round-trip means role or activation changes apply immediately
//! instead of waiting out the token expiry.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::{self, Role, User};

use super::jwt::JwtKeys;

/// Any authenticated identity.
#[derive(Debug)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// An authenticated identity whose stored role is ADMIN.
#[derive(Debug)]
pub struct AdminUser {
    pub id: i64,
}

async fn resolve_identity(parts: &mut Parts, state: &AppState) -> Result<User, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(ApiError::unauthorized)?;

    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::unauthorized()
    })?;

    repo::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Forbidden)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_identity(parts, state).await?;
        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_identity(parts, state).await?;
        match user.role {
            Role::Admin => Ok(AdminUser { id: user.id }),
            Role::User => {
                warn!(user_id = user.id, "admin route denied");
                Err(ApiError::Forbidden)
            }
        }
    }
}
