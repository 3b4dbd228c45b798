use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::{like_pattern, now_rfc3339};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "quantityInStock")]
    pub quantity_in_stock: i64,
    pub price: f64,
    pub image: Option<String>,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// List row with the owner's display fields joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "quantityInStock")]
    pub quantity_in_stock: i64,
    pub price: f64,
    pub image: Option<String>,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(rename = "owner_firstName")]
    pub owner_first_name: Option<String>,
    #[serde(rename = "owner_lastName")]
    pub owner_last_name: Option<String>,
}

pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub quantity_in_stock: i64,
    pub price: f64,
    pub image: Option<&'a str>,
    pub owner_id: i64,
}

#[derive(Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity_in_stock: Option<i64>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub owner_id: Option<i64>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, quantity_in_stock, price, image, owner_id, created_at, updated_at";

pub async fn create(db: &SqlitePool, product: NewProduct<'_>) -> anyhow::Result<i64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        r#"
        INSERT INTO products
            (name, description, quantity_in_stock, price, image, owner_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.quantity_in_stock)
    .bind(product.price)
    .bind(product.image)
    .bind(product.owner_id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

pub async fn list(
    db: &SqlitePool,
    q: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductListItem>> {
    let pattern = like_pattern(q);
    let rows = sqlx::query_as::<_, ProductListItem>(
        r#"
        SELECT p.id, p.name, p.description, p.quantity_in_stock, p.price, p.image,
               p.owner_id, p.created_at, p.updated_at,
               u.first_name AS owner_first_name, u.last_name AS owner_last_name
        FROM products p
        LEFT JOIN users u ON u.id = p.owner_id
        WHERE p.name LIKE ?1 OR p.description LIKE ?1
        ORDER BY p.id
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

/// Unpaginated listing for the HTML/PDF exports.
pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn update(db: &SqlitePool, id: i64, patch: ProductPatch) -> anyhow::Result<u64> {
    let now = now_rfc3339()?;
    let res = sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            quantity_in_stock = COALESCE(?, quantity_in_stock),
            price = COALESCE(?, price),
            image = COALESCE(?, image),
            owner_id = COALESCE(?, owner_id),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.quantity_in_stock)
    .bind(patch.price)
    .bind(patch.image)
    .bind(patch.owner_id)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM products")
        .fetch_one(db)
        .await?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::testutil::seed_user;
    use crate::users::repo::Role;

    async fn seed_product(state: &AppState, name: &str, owner_id: i64) -> i64 {
        create(
            &state.db,
            NewProduct {
                name,
                description: "a thing",
                quantity_in_stock: 10,
                price: 9.99,
                image: None,
                owner_id,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn list_joins_owner_display_fields() {
        let state = AppState::for_tests().await;
        let owner = seed_user(&state, "owner@b.com", "1", Role::Admin, true).await;
        seed_product(&state, "Mug", owner).await;

        let rows = list(&state.db, None, 20, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owner_first_name.as_deref(), Some("Test"));
        assert_eq!(rows[0].owner_last_name.as_deref(), Some("User"));

        // Dangling owner still lists, with empty display fields.
        seed_product(&state, "Orphan", 999).await;
        let rows = list(&state.db, Some("Orphan"), 20, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].owner_first_name.is_none());
    }

    #[tokio::test]
    async fn filter_matches_name_or_description() {
        let state = AppState::for_tests().await;
        let owner = seed_user(&state, "owner@b.com", "1", Role::Admin, true).await;
        seed_product(&state, "Mug", owner).await;
        create(
            &state.db,
            NewProduct {
                name: "Plate",
                description: "ceramic mug holder",
                quantity_in_stock: 1,
                price: 1.0,
                image: None,
                owner_id: owner,
            },
        )
        .await
        .unwrap();

        let rows = list(&state.db, Some("mug"), 20, 0).await.unwrap();
        assert_eq!(rows.len(), 2);

        let rows = list(&state.db, Some("Plate"), 20, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let state = AppState::for_tests().await;
        let owner = seed_user(&state, "owner@b.com", "1", Role::Admin, true).await;
        let id = seed_product(&state, "Mug", owner).await;

        let rows = update(
            &state.db,
            id,
            ProductPatch {
                price: Some(12.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(rows, 1);

        let product = find_by_id(&state.db, id).await.unwrap().unwrap();
        assert_eq!(product.price, 12.5);
        assert_eq!(product.name, "Mug");
        assert_eq!(product.quantity_in_stock, 10);
    }

    #[tokio::test]
    async fn delete_and_count() {
        let state = AppState::for_tests().await;
        let owner = seed_user(&state, "owner@b.com", "1", Role::Admin, true).await;
        let id = seed_product(&state, "Mug", owner).await;

        assert_eq!(count(&state.db).await.unwrap(), 1);
        assert_eq!(delete(&state.db, id).await.unwrap(), 1);
        assert_eq!(delete(&state.db, id).await.unwrap(), 0);
        assert_eq!(count(&state.db).await.unwrap(), 0);
    }
}
