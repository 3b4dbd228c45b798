use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, Envelope};
use crate::pagination::{list_query, ListQuery};
use crate::state::AppState;

use super::dto::{CreateRatingRequest, UpdateRatingRequest};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ratings", post(create_rating).get(list_ratings))
        .route(
            "/ratings/:id",
            get(get_rating).patch(update_rating).delete(delete_rating),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_rating(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<Envelope, ApiError> {
    let (Some(value), Some(product_id)) = (payload.value, payload.product_id) else {
        return Err(ApiError::malformed());
    };

    // The user reference comes from the guard and therefore exists; the
    // product reference is checked here since the schema does not.
    if crate::products::repo::find_by_id(&state.db, product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::bad_request(
            "product_id must reference an existing product.",
        ));
    }

    let id = repo::create(&state.db, value, auth.id, product_id).await?;

    info!(rating_id = id, user_id = auth.id, role = ?auth.role, product_id, "rating created");
    Ok(Envelope::created().with("id", id))
}

#[instrument(skip(state, query))]
pub async fn list_ratings(
    State(state): State<AppState>,
    _auth: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope, ApiError> {
    let query = list_query(query)?;
    let (limit, offset) = query.limit_offset()?;
    let ratings = repo::list(&state.db, query.q.as_deref(), limit, offset).await?;
    Ok(Envelope::ok().with("data", ratings))
}

#[instrument(skip(state))]
pub async fn get_rating(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let rating = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Envelope::ok().with("data", rating))
}

#[instrument(skip(state, payload))]
pub async fn update_rating(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRatingRequest>,
) -> Result<Envelope, ApiError> {
    let rows = repo::update(&state.db, id, payload.value).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Envelope::ok().with("id", id))
}

#[instrument(skip(state))]
pub async fn delete_rating(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let rows = repo::delete(&state.db, id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    info!(rating_id = id, "rating deleted");
    Ok(Envelope::ok().with("id", id))
}
