use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::Activity;
use crate::db;
use crate::errors::AppResult;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Newest-first audit feed of everything the team did.
pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Activity>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let activities = db::activities::list(&state.db, &caller.team_id, limit).await?;
    Ok(Json(activities))
}
