use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::errors::AppResult;

/// Liveness probe with a database ping.
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&state.db).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
