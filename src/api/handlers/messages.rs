//! Conversation and message endpoints for the team-facing inbox.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::{Author, Channel, Conversation, Direction, Message, MessageStatus};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::inbound::dispatch_outbound;

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub channel: Channel,
    pub customer_address: String,
    pub customer_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct BotToggleRequest {
    pub enabled: bool,
}

pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<Conversation>>> {
    let conversations = db::conversations::list(&state.db, &caller.team_id).await?;
    Ok(Json(conversations))
}

/// Opens (or returns) the conversation for a customer address, so agents
/// can start outreach without waiting for an inbound message.
pub async fn open(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<OpenConversationRequest>,
) -> AppResult<(StatusCode, Json<Conversation>)> {
    validate_address(request.channel, &request.customer_address)?;
    let conversation = db::conversations::upsert(
        &state.db,
        &caller.team_id,
        request.channel,
        request.customer_address.trim(),
        request.customer_name.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Message>>> {
    let conversation = require_conversation(&state, &caller, &id).await?;
    let messages = db::conversations::list_messages(&state.db, &conversation.id).await?;
    Ok(Json(messages))
}

/// Agent reply. The message is stored first; a provider rejection marks
/// it `failed` with the mapped code and still returns 201, so the client
/// sees the failure on the message record instead of a 5xx.
pub async fn send(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    if request.body.trim().is_empty() {
        return Err(AppError::validation("message body cannot be empty"));
    }
    let conversation = require_conversation(&state, &caller, &id).await?;

    let message = db::conversations::append_message(
        &state.db,
        &conversation.id,
        Direction::Outbound,
        Author::Agent,
        request.body.trim(),
        MessageStatus::Queued,
    )
    .await?;

    let message = dispatch_outbound(&state, &conversation, message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn set_bot(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<BotToggleRequest>,
) -> AppResult<StatusCode> {
    let changed =
        db::conversations::set_bot_enabled(&state.db, &caller.team_id, &id, request.enabled)
            .await?;
    if !changed {
        return Err(AppError::not_found(format!("conversation {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn require_conversation(
    state: &AppState,
    caller: &AuthUser,
    id: &str,
) -> AppResult<Conversation> {
    db::conversations::find(&state.db, &caller.team_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("conversation {id}")))
}

fn validate_address(channel: Channel, address: &str) -> AppResult<()> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::validation("customer address cannot be empty"));
    }
    match channel {
        Channel::Email => {
            if !address.contains('@') {
                return Err(AppError::validation(format!(
                    "not an email address: {address}"
                )));
            }
        }
        Channel::Sms | Channel::Whatsapp => {
            let digits = address.trim_start_matches("whatsapp:");
            if !digits.starts_with('+') || digits.len() < 8 {
                return Err(AppError::validation(format!(
                    "phone numbers must be E.164, got {address}"
                )));
            }
        }
        Channel::Web => {}
    }
    Ok(())
}
