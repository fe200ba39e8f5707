use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::models::Product;
use crate::errors::{AppError, AppResult};

pub async fn insert(pool: &SqlitePool, product: &Product) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO products
           (id, team_id, name, sku, description, price_cents, quantity,
            min_threshold, low_stock_alert, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&product.id)
    .bind(&product.team_id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.quantity)
    .bind(product.min_threshold)
    .bind(product.low_stock_alert)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            AppError::Conflict(format!("sku already in use: {}", product.sku))
        } else {
            AppError::Database(e)
        }
    })?;
    Ok(())
}

pub async fn list(pool: &SqlitePool, team_id: &str) -> AppResult<Vec<Product>> {
    let products =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE team_id = ?1 ORDER BY name")
            .bind(team_id)
            .fetch_all(pool)
            .await?;
    Ok(products)
}

pub async fn find(pool: &SqlitePool, team_id: &str, id: &str) -> AppResult<Option<Product>> {
    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1 AND team_id = ?2")
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await?;
    Ok(product)
}

/// Updates the editable fields and recomputes the low-stock flag.
pub async fn update(pool: &SqlitePool, product: &Product) -> AppResult<()> {
    sqlx::query(
        "UPDATE products
         SET name = ?1, sku = ?2, description = ?3, price_cents = ?4,
             quantity = ?5, min_threshold = ?6,
             low_stock_alert = CASE WHEN ?5 <= ?6 THEN 1 ELSE 0 END,
             updated_at = ?7
         WHERE id = ?8 AND team_id = ?9",
    )
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.quantity)
    .bind(product.min_threshold)
    .bind(Utc::now())
    .bind(&product.id)
    .bind(&product.team_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            AppError::Conflict(format!("sku already in use: {}", product.sku))
        } else {
            AppError::Database(e)
        }
    })?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, team_id: &str, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND team_id = ?2")
        .bind(id)
        .bind(team_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Case-insensitive lookup by (partial) product name, used by the
/// chatbot's price/stock intents. Exact matches win over substring hits.
pub async fn find_by_name(
    pool: &SqlitePool,
    team_id: &str,
    name: &str,
) -> AppResult<Option<Product>> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE team_id = ?1 AND name LIKE ?2 COLLATE NOCASE
         ORDER BY CASE WHEN name = ?3 COLLATE NOCASE THEN 0 ELSE 1 END, name
         LIMIT 1",
    )
    .bind(team_id)
    .bind(format!("%{trimmed}%"))
    .bind(trimmed)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

pub async fn list_low_stock(pool: &SqlitePool, team_id: &str) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE team_id = ?1 AND low_stock_alert = 1
         ORDER BY quantity ASC",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Adds stock back and clears the alert once the quantity is above the
/// threshold again. Returns the updated row, or `None` when the product
/// does not belong to the team.
pub async fn restock(
    pool: &SqlitePool,
    team_id: &str,
    id: &str,
    amount: i64,
) -> AppResult<Option<Product>> {
    let result = sqlx::query(
        "UPDATE products
         SET quantity = quantity + ?1,
             low_stock_alert = CASE WHEN quantity + ?1 <= min_threshold THEN 1 ELSE 0 END,
             updated_at = ?2
         WHERE id = ?3 AND team_id = ?4",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .bind(team_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, team_id, id).await
}
