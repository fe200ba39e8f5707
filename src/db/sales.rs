use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::core::models::{Product, Sale, new_id};
use crate::errors::{AppError, AppResult};

/// Outcome of recording a sale inside one transaction.
#[derive(Debug)]
pub struct RecordedSale {
    pub sale: Sale,
    pub product: Product,
    /// Set when this sale moved the product from above its threshold to
    /// at-or-below it. The caller emits exactly one low-stock alert on
    /// this edge.
    pub crossed_low_stock: bool,
}

/// Records a sale, decrementing stock atomically. The stock guard and the
/// sale insert share a transaction so concurrent sales can never oversell.
pub async fn record(
    pool: &SqlitePool,
    team_id: &str,
    seller_id: &str,
    product_id: &str,
    quantity: i64,
) -> AppResult<RecordedSale> {
    let mut tx = pool.begin().await?;

    let before = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ?1 AND team_id = ?2",
    )
    .bind(product_id)
    .bind(team_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found(format!("product {product_id}")))?;

    let updated = sqlx::query(
        "UPDATE products
         SET quantity = quantity - ?1,
             low_stock_alert = CASE WHEN quantity - ?1 <= min_threshold THEN 1 ELSE 0 END,
             updated_at = ?2
         WHERE id = ?3 AND quantity >= ?1",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Transaction drops here, rolling back.
        return Err(AppError::Conflict(format!(
            "insufficient stock for {}: {} on hand, {} requested",
            before.name, before.quantity, quantity
        )));
    }

    let sale = Sale {
        id: new_id(),
        team_id: team_id.to_string(),
        product_id: product_id.to_string(),
        seller_id: seller_id.to_string(),
        quantity,
        unit_price_cents: before.price_cents,
        total_cents: quantity * before.price_cents,
        sold_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO sales
           (id, team_id, product_id, seller_id, quantity, unit_price_cents, total_cents, sold_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&sale.id)
    .bind(&sale.team_id)
    .bind(&sale.product_id)
    .bind(&sale.seller_id)
    .bind(sale.quantity)
    .bind(sale.unit_price_cents)
    .bind(sale.total_cents)
    .bind(sale.sold_at)
    .execute(&mut *tx)
    .await?;

    let after = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    let crossed_low_stock = !before.low_stock_alert && after.low_stock_alert;
    Ok(RecordedSale {
        sale,
        product: after,
        crossed_low_stock,
    })
}

pub async fn list(pool: &SqlitePool, team_id: &str, limit: i64) -> AppResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(
        "SELECT * FROM sales WHERE team_id = ?1 ORDER BY sold_at DESC LIMIT ?2",
    )
    .bind(team_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

pub async fn list_for_product(
    pool: &SqlitePool,
    team_id: &str,
    product_id: &str,
    limit: i64,
) -> AppResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(
        "SELECT * FROM sales
         WHERE team_id = ?1 AND product_id = ?2
         ORDER BY sold_at DESC LIMIT ?3",
    )
    .bind(team_id)
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

/// A sale row joined with product and seller names, for the summary,
/// leaderboard, and forecasting reports. Deleted products and removed
/// members keep their historical rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRecord {
    pub product_id: String,
    pub product_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub quantity: i64,
    pub total_cents: i64,
    pub sold_at: DateTime<Utc>,
}

pub async fn records_since(
    pool: &SqlitePool,
    team_id: &str,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<SaleRecord>> {
    let records = sqlx::query_as::<_, SaleRecord>(
        "SELECT s.product_id,
                COALESCE(p.name, '(deleted product)') AS product_name,
                s.seller_id,
                COALESCE(u.display_name, '(former member)') AS seller_name,
                s.quantity,
                s.total_cents,
                s.sold_at
         FROM sales s
         LEFT JOIN products p ON p.id = s.product_id
         LEFT JOIN users u ON u.id = s.seller_id
         WHERE s.team_id = ?1 AND s.sold_at >= ?2
         ORDER BY s.sold_at",
    )
    .bind(team_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(records)
}
