//! Back-office summary counters. "Sellers" are the ADMIN accounts; "reviews"
//! are rating rows.

use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use crate::users::repo::Role;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/total/users", get(total_users))
        .route("/dashboard/total/sellers", get(total_sellers))
        .route("/dashboard/total/products", get(total_products))
        .route("/dashboard/total/reviews", get(total_reviews))
}

#[instrument(skip(state))]
pub async fn total_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Envelope, ApiError> {
    let total = crate::users::repo::count_by_role(&state.db, Role::User).await?;
    Ok(Envelope::ok().with("total", total))
}

#[instrument(skip(state))]
pub async fn total_sellers(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Envelope, ApiError> {
    let total = crate::users::repo::count_by_role(&state.db, Role::Admin).await?;
    Ok(Envelope::ok().with("total", total))
}

#[instrument(skip(state))]
pub async fn total_products(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Envelope, ApiError> {
    let total = crate::products::repo::count(&state.db).await?;
    Ok(Envelope::ok().with("total", total))
}

#[instrument(skip(state))]
pub async fn total_reviews(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Envelope, ApiError> {
    let total = crate::ratings::repo::count(&state.db).await?;
    Ok(Envelope::ok().with("total", total))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::products::repo::NewProduct;
    use crate::state::AppState;
    use crate::testutil::{bearer, get, seed_user};
    use crate::users::repo::Role;

    #[tokio::test]
    async fn totals_split_users_sellers_products_reviews() {
        let state = AppState::for_tests().await;
        let user = seed_user(&state, "user@b.com", "1", Role::User, true).await;
        seed_user(&state, "admin@b.com", "2", Role::Admin, true).await;
        let token = bearer(&state, user, Role::User);

        let product = crate::products::repo::create(
            &state.db,
            NewProduct {
                name: "Mug",
                description: "ceramic",
                quantity_in_stock: 1,
                price: 2.0,
                image: None,
                owner_id: user,
            },
        )
        .await
        .unwrap();
        crate::ratings::repo::create(&state.db, 5, user, product)
            .await
            .unwrap();

        for (path, expected) in [
            ("/dashboard/total/users", 1),
            ("/dashboard/total/sellers", 1),
            ("/dashboard/total/products", 1),
            ("/dashboard/total/reviews", 1),
        ] {
            let (status, body) = get(&state, path, Some(&token)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["total"], expected, "{path}");
            assert_eq!(body["alias"], "OK");
        }
    }

    #[tokio::test]
    async fn totals_require_authentication() {
        let state = AppState::for_tests().await;
        let (status, _) = get(&state, "/dashboard/total/users", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
