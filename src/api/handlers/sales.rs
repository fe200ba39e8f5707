//! Point-of-sale endpoints: recording, listing, and revenue summary.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::parse_period;
use crate::ai::format_cents;
use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::{NotificationKind, Product, Sale};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::notify;
use crate::reports::{self, SalesSummary};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct RecordSaleResponse {
    pub sale: Sale,
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub async fn record(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<RecordSaleRequest>,
) -> AppResult<(StatusCode, Json<RecordSaleResponse>)> {
    if request.quantity <= 0 {
        return Err(AppError::validation("sale quantity must be positive"));
    }

    let recorded = db::sales::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        &request.product_id,
        request.quantity,
    )
    .await?;

    notify::emit(
        &state.db,
        &state.hub,
        &caller.team_id,
        None,
        NotificationKind::SaleRecorded,
        "Sale recorded".to_string(),
        format!(
            "{} x{} for {}",
            recorded.product.name,
            recorded.sale.quantity,
            format_cents(recorded.sale.total_cents)
        ),
    )
    .await?;

    if recorded.crossed_low_stock {
        super::products::notify_low_stock(&state, &caller.team_id, &recorded.product).await?;
    }

    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "recorded_sale",
        "sale",
        &recorded.sale.id,
        Some(format!("{} x{}", recorded.product.name, recorded.sale.quantity)),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RecordSaleResponse {
            sale: recorded.sale,
            product: recorded.product,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let sales = db::sales::list(&state.db, &caller.team_id, limit).await?;
    Ok(Json(sales))
}

pub async fn summary(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<SalesSummary>> {
    let (days, cutoff) = parse_period(query.period.as_deref())?;
    let records = db::sales::records_since(&state.db, &caller.team_id, cutoff).await?;
    Ok(Json(reports::summarize(&records, days)))
}

/// Sales of a single product, newest first; the inventory screen uses
/// this for the per-product history drawer.
pub async fn list_for_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(product_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    // Existence check keeps 404 semantics consistent with /products/:id.
    db::products::find(&state.db, &caller.team_id, &product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {product_id}")))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let sales = db::sales::list_for_product(&state.db, &caller.team_id, &product_id, limit).await?;
    Ok(Json(sales))
}
