//! Public web-chat endpoints.
//!
//! Customers hold an opaque session key; the widget posts messages and
//! polls the same conversation for replies. There is no bearer token;
//! the session key scopes what is readable.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::core::models::{Channel, Message};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::inbound::process_inbound;

const MAX_BODY_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct WebchatMessageRequest {
    pub session_key: String,
    pub customer_name: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct WebchatMessageResponse {
    pub conversation_id: String,
    pub message: Message,
    /// Present when the bot answered synchronously.
    pub bot_reply: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub session_key: String,
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(request): Json<WebchatMessageRequest>,
) -> AppResult<(StatusCode, Json<WebchatMessageResponse>)> {
    let session_key = request.session_key.trim();
    if session_key.is_empty() {
        return Err(AppError::validation("session_key cannot be empty"));
    }
    let body = request.body.trim();
    if body.is_empty() {
        return Err(AppError::validation("message body cannot be empty"));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(AppError::validation(format!(
            "message body exceeds {MAX_BODY_CHARS} characters"
        )));
    }

    let outcome = process_inbound(
        &state,
        &team_id,
        Channel::Web,
        session_key,
        request.customer_name.as_deref(),
        body,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(WebchatMessageResponse {
            conversation_id: outcome.conversation.id.clone(),
            message: outcome.inbound,
            bot_reply: outcome.bot_reply,
        }),
    ))
}

/// Poll for the conversation transcript. An unknown session returns an
/// empty list rather than leaking whether a session exists.
pub async fn poll(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Query(query): Query<PollQuery>,
) -> AppResult<Json<Vec<Message>>> {
    let conversation = db::conversations::find_by_address(
        &state.db,
        &team_id,
        Channel::Web,
        query.session_key.trim(),
    )
    .await?;

    match conversation {
        Some(conversation) => {
            let messages = db::conversations::list_messages(&state.db, &conversation.id).await?;
            Ok(Json(messages))
        }
        None => Ok(Json(Vec::new())),
    }
}
