//! Forecasting endpoints: sales revenue and inventory depletion.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::forecast::{
    DEFAULT_ALPHA, DEPLETION_WINDOW_DAYS, days_to_stockout, exponential_smoothing, flat_forecast,
    moving_average,
};
use crate::reports;

/// How much history feeds the revenue forecast.
const HISTORY_DAYS: i64 = 90;

const MAX_HORIZON: usize = 30;

#[derive(Debug, Deserialize)]
pub struct SalesForecastQuery {
    pub horizon: Option<usize>,
    pub alpha: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SalesForecastResponse {
    pub history_days: i64,
    pub daily_revenue_cents: Vec<i64>,
    pub level_cents: i64,
    pub forecast_cents: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct DepletionEntry {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub avg_daily_units: Option<f64>,
    pub days_to_stockout: Option<f64>,
}

/// Smooths the trailing daily-revenue series and projects it flat over
/// the horizon.
pub async fn sales(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<SalesForecastQuery>,
) -> AppResult<Json<SalesForecastResponse>> {
    let horizon = query.horizon.unwrap_or(7);
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(AppError::validation(format!(
            "horizon must be between 1 and {MAX_HORIZON}"
        )));
    }
    let alpha = query.alpha.unwrap_or(DEFAULT_ALPHA);
    if !(0.0..=1.0).contains(&alpha) || alpha == 0.0 {
        return Err(AppError::validation("alpha must be in (0, 1]"));
    }

    let now = Utc::now();
    let records =
        db::sales::records_since(&state.db, &caller.team_id, now - Duration::days(HISTORY_DAYS))
            .await?;
    let series = reports::daily_revenue_series(&records, now, HISTORY_DAYS);

    let level = exponential_smoothing(&series, alpha).unwrap_or(0.0);
    let forecast = flat_forecast(level, horizon);

    Ok(Json(SalesForecastResponse {
        history_days: HISTORY_DAYS,
        daily_revenue_cents: series.iter().map(|v| v.round() as i64).collect(),
        level_cents: level.round() as i64,
        forecast_cents: forecast.iter().map(|v| v.round() as i64).collect(),
    }))
}

/// Per-product days-to-stockout from the trailing consumption window.
pub async fn inventory(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<DepletionEntry>>> {
    let now = Utc::now();
    let products = db::products::list(&state.db, &caller.team_id).await?;
    let records = db::sales::records_since(
        &state.db,
        &caller.team_id,
        now - Duration::days(DEPLETION_WINDOW_DAYS),
    )
    .await?;

    let entries = products
        .into_iter()
        .map(|product| {
            let daily =
                reports::daily_units_series(&records, &product.id, now, DEPLETION_WINDOW_DAYS);
            let avg = moving_average(&daily, daily.len()).filter(|v| *v > 0.0);
            let days = days_to_stockout(product.quantity, &daily);
            DepletionEntry {
                product_id: product.id,
                name: product.name,
                quantity: product.quantity,
                avg_daily_units: avg.map(round1),
                days_to_stockout: days.map(round1),
            }
        })
        .collect();

    Ok(Json(entries))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
