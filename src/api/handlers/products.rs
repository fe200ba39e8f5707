//! Product / inventory endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::{NotificationKind, Product, new_id};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::notify;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i64,
    pub min_threshold: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
    pub min_threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub amount: i64,
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    validate_fields(
        &request.name,
        &request.sku,
        request.price_cents,
        request.quantity,
        request.min_threshold,
    )?;

    let now = Utc::now();
    let product = Product {
        id: new_id(),
        team_id: caller.team_id.clone(),
        name: request.name.trim().to_string(),
        sku: request.sku.trim().to_string(),
        description: request.description,
        price_cents: request.price_cents,
        quantity: request.quantity,
        min_threshold: request.min_threshold,
        low_stock_alert: request.quantity <= request.min_threshold,
        created_at: now,
        updated_at: now,
    };

    db::products::insert(&state.db, &product).await?;
    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "created",
        "product",
        &product.id,
        Some(product.name.clone()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list(State(state): State<AppState>, caller: AuthUser) -> AppResult<Json<Vec<Product>>> {
    let products = db::products::list(&state.db, &caller.team_id).await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = db::products::find(&state.db, &caller.team_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;
    Ok(Json(product))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let before = db::products::find(&state.db, &caller.team_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    let mut product = before.clone();
    if let Some(name) = request.name {
        product.name = name;
    }
    if let Some(sku) = request.sku {
        product.sku = sku;
    }
    if let Some(description) = request.description {
        product.description = Some(description);
    }
    if let Some(price_cents) = request.price_cents {
        product.price_cents = price_cents;
    }
    if let Some(quantity) = request.quantity {
        product.quantity = quantity;
    }
    if let Some(min_threshold) = request.min_threshold {
        product.min_threshold = min_threshold;
    }
    validate_fields(
        &product.name,
        &product.sku,
        product.price_cents,
        product.quantity,
        product.min_threshold,
    )?;

    db::products::update(&state.db, &product).await?;
    let updated = db::products::find(&state.db, &caller.team_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    // An edit can push stock to or below the threshold; alert once on
    // that edge, same as a sale would.
    if !before.low_stock_alert && updated.low_stock_alert {
        notify_low_stock(&state, &caller.team_id, &updated).await?;
    }

    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let removed = db::products::delete(&state.db, &caller.team_id, &id).await?;
    if !removed {
        return Err(AppError::not_found(format!("product {id}")));
    }
    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "deleted",
        "product",
        &id,
        None,
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn low_stock(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<Product>>> {
    let products = db::products::list_low_stock(&state.db, &caller.team_id).await?;
    Ok(Json(products))
}

pub async fn restock(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RestockRequest>,
) -> AppResult<Json<Product>> {
    if request.amount <= 0 {
        return Err(AppError::validation("restock amount must be positive"));
    }
    let product = db::products::restock(&state.db, &caller.team_id, &id, request.amount)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {id}")))?;

    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "restocked",
        "product",
        &product.id,
        Some(format!("+{}", request.amount)),
    )
    .await;

    Ok(Json(product))
}

pub(crate) async fn notify_low_stock(
    state: &AppState,
    team_id: &str,
    product: &Product,
) -> AppResult<()> {
    notify::emit(
        &state.db,
        &state.hub,
        team_id,
        None,
        NotificationKind::LowStock,
        format!("Low stock: {}", product.name),
        format!(
            "{} is down to {} (threshold {})",
            product.name, product.quantity, product.min_threshold
        ),
    )
    .await?;
    Ok(())
}

fn validate_fields(
    name: &str,
    sku: &str,
    price_cents: i64,
    quantity: i64,
    min_threshold: i64,
) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("product name cannot be empty"));
    }
    if sku.trim().is_empty() {
        return Err(AppError::validation("sku cannot be empty"));
    }
    if price_cents < 0 {
        return Err(AppError::validation("price cannot be negative"));
    }
    if quantity < 0 {
        return Err(AppError::validation("quantity cannot be negative"));
    }
    if min_threshold < 0 {
        return Err(AppError::validation("threshold cannot be negative"));
    }
    Ok(())
}
