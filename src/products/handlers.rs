use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    routing::get,
    Router,
};
use bytes::Bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, Envelope};
use crate::pagination::{list_query, ListQuery};
use crate::state::AppState;
use crate::storage::ext_from_mime;

use super::export;
use super::repo::{self, NewProduct, ProductPatch};

const BODY_LIMIT: usize = 20 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            axum::routing::post(create_product).get(list_products),
        )
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/html/list", get(export::html_list))
        .route("/products/pdf/list", get(export::pdf_list))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Text fields plus an optional `image` file, pulled out of one multipart
/// pass.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    quantity_in_stock: Option<String>,
    price: Option<String>,
    owner_id: Option<String>,
    image: Option<(Bytes, String)>,
}

impl ProductForm {
    async fn read(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = mp.next_field().await.map_err(|_| ApiError::malformed())? {
            let Some(name) = field.name().map(|s| s.to_string()) else {
                continue;
            };
            match name.as_str() {
                "image" => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await.map_err(|_| ApiError::malformed())?;
                    if !data.is_empty() {
                        form.image = Some((data, content_type));
                    }
                }
                other => {
                    let value = field.text().await.map_err(|_| ApiError::malformed())?;
                    if value.is_empty() {
                        continue;
                    }
                    match other {
                        "name" => form.name = Some(value),
                        "description" => form.description = Some(value),
                        "quantityInStock" => form.quantity_in_stock = Some(value),
                        "price" => form.price = Some(value),
                        "owner_id" => form.owner_id = Some(value),
                        _ => {}
                    }
                }
            }
        }
        Ok(form)
    }

    async fn store_image(&self, state: &AppState) -> Result<Option<String>, ApiError> {
        let Some((data, content_type)) = &self.image else {
            return Ok(None);
        };
        let key = format!("products/{}.{}", Uuid::new_v4(), ext_from_mime(content_type));
        let path = state
            .storage
            .put_object(&key, data.clone(), content_type)
            .await?;
        Ok(Some(path))
    }
}

fn parse_i64(v: &str, field: &str) -> Result<i64, ApiError> {
    v.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("{field} must be a number.")))
}

fn parse_f64(v: &str, field: &str) -> Result<f64, ApiError> {
    v.parse::<f64>()
        .map_err(|_| ApiError::bad_request(format!("{field} must be a number.")))
}

#[instrument(skip(state, mp))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminUser,
    mp: Multipart,
) -> Result<Envelope, ApiError> {
    let form = ProductForm::read(mp).await?;

    let (Some(name), Some(description), Some(quantity), Some(price), Some(owner)) = (
        &form.name,
        &form.description,
        &form.quantity_in_stock,
        &form.price,
        &form.owner_id,
    ) else {
        return Err(ApiError::malformed());
    };

    let quantity_in_stock = parse_i64(quantity, "quantityInStock")?;
    let price = parse_f64(price, "price")?;
    let owner_id = parse_i64(owner, "owner_id")?;

    let image = form.store_image(&state).await?;

    let id = repo::create(
        &state.db,
        NewProduct {
            name,
            description,
            quantity_in_stock,
            price,
            image: image.as_deref(),
            owner_id,
        },
    )
    .await?;

    info!(product_id = id, admin_id = admin.id, "product created");
    Ok(Envelope::created().with("id", id))
}

#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    _auth: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope, ApiError> {
    let query = list_query(query)?;
    let (limit, offset) = query.limit_offset()?;
    let products = repo::list(&state.db, query.q.as_deref(), limit, offset).await?;
    Ok(Envelope::ok().with("data", products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let product = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Envelope::ok().with("data", product))
}

#[instrument(skip(state, mp))]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    mp: Multipart,
) -> Result<Envelope, ApiError> {
    let form = ProductForm::read(mp).await?;

    let patch = ProductPatch {
        name: form.name.clone(),
        description: form.description.clone(),
        quantity_in_stock: form
            .quantity_in_stock
            .as_deref()
            .map(|v| parse_i64(v, "quantityInStock"))
            .transpose()?,
        price: form
            .price
            .as_deref()
            .map(|v| parse_f64(v, "price"))
            .transpose()?,
        owner_id: form
            .owner_id
            .as_deref()
            .map(|v| parse_i64(v, "owner_id"))
            .transpose()?,
        image: form.store_image(&state).await?,
    };

    let rows = repo::update(&state.db, id, patch).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Envelope::ok().with("id", id))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Envelope, ApiError> {
    let rows = repo::delete(&state.db, id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    info!(product_id = id, "product deleted");
    Ok(Envelope::ok().with("id", id))
}
