//! Notification endpoints, including the live SSE stream.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::Notification;
use crate::db;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub unread: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = db::notifications::list_for_user(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        query.unread.unwrap_or(false),
    )
    .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let updated = db::notifications::mark_read(&state.db, &caller.team_id, &id).await?;
    if !updated {
        return Err(AppError::not_found(format!("notification {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let updated =
        db::notifications::mark_all_read(&state.db, &caller.team_id, &caller.user_id).await?;
    Ok(Json(json!({ "marked_read": updated })))
}

/// Server-sent event stream of the team's notifications.
///
/// Slow subscribers that lag past the channel buffer simply miss the
/// overwritten events; the persisted list is the source of truth.
pub async fn stream(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.hub.subscribe(&caller.team_id);

    let stream = BroadcastStream::new(receiver).filter_map(|result| async move {
        let notification = result.ok()?;
        let event = Event::default()
            .event("notification")
            .json_data(&notification)
            .ok()?;
        Some(Ok(event))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
