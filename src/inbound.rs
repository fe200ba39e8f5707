//! Inbound customer-message pipeline, shared by the Twilio webhook and
//! the public web-chat endpoint.
//!
//! Stores the message, notifies the team, and, when the conversation has
//! auto-replies on, generates and dispatches the bot's answer. Provider
//! failures downgrade the outbound message to `failed`; they never bubble
//! up to the webhook caller.

use tracing::{error, info};

use crate::ai;
use crate::api::state::AppState;
use crate::core::models::{
    Author, Channel, Conversation, Direction, Message, MessageStatus, NotificationKind,
};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::notify;

/// Longest notification body snippet, in characters.
const SNIPPET_LEN: usize = 80;

#[derive(Debug)]
pub struct InboundOutcome {
    pub conversation: Conversation,
    pub inbound: Message,
    pub bot_reply: Option<Message>,
}

pub async fn process_inbound(
    state: &AppState,
    team_id: &str,
    channel: Channel,
    customer_address: &str,
    customer_name: Option<&str>,
    body: &str,
) -> AppResult<InboundOutcome> {
    let team = db::teams::find_by_id(&state.db, team_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("team {team_id}")))?;

    let conversation =
        db::conversations::upsert(&state.db, team_id, channel, customer_address, customer_name)
            .await?;

    let inbound = db::conversations::append_message(
        &state.db,
        &conversation.id,
        Direction::Inbound,
        Author::Customer,
        body,
        MessageStatus::Received,
    )
    .await?;

    let display = conversation
        .customer_name
        .as_deref()
        .unwrap_or(&conversation.customer_address);
    notify::emit(
        &state.db,
        &state.hub,
        team_id,
        None,
        NotificationKind::NewMessage,
        format!("New {} message", channel.as_str()),
        format!("{display}: {}", snippet(body)),
    )
    .await?;

    let reply = ai::generate_reply(
        &state.db,
        state.llm.as_deref(),
        &team,
        &conversation,
        body,
    )
    .await?;

    let bot_reply = match reply {
        Some(reply) => Some(dispatch_bot_reply(state, &conversation, reply).await?),
        None => None,
    };

    Ok(InboundOutcome {
        conversation,
        inbound,
        bot_reply,
    })
}

/// Persists the bot reply and hands it to the conversation's provider.
async fn dispatch_bot_reply(
    state: &AppState,
    conversation: &Conversation,
    reply: ai::BotReply,
) -> AppResult<Message> {
    let message = db::conversations::append_message(
        &state.db,
        &conversation.id,
        Direction::Outbound,
        Author::Bot,
        &reply.body,
        MessageStatus::Queued,
    )
    .await?;

    let message = dispatch_outbound(state, conversation, message).await?;
    if message.status == MessageStatus::Sent {
        info!(
            conversation = %conversation.id,
            source = ?reply.source,
            "bot reply dispatched"
        );
    }
    Ok(message)
}

/// Hands a queued outbound message to the conversation's provider and
/// records the outcome. A provider rejection downgrades the message to
/// `failed` with the mapped code; it is not an error to the caller.
pub async fn dispatch_outbound(
    state: &AppState,
    conversation: &Conversation,
    mut message: Message,
) -> AppResult<Message> {
    match state
        .channels
        .dispatch(
            conversation.channel,
            &conversation.customer_address,
            &message.body,
        )
        .await
    {
        Ok(receipt) => {
            db::conversations::mark_dispatched(
                &state.db,
                &message.id,
                MessageStatus::Sent,
                receipt.provider_sid.as_deref(),
                None,
            )
            .await?;
            message.status = MessageStatus::Sent;
            message.provider_sid = receipt.provider_sid;
        }
        Err(AppError::Channel {
            code,
            message: why,
            channel,
        }) => {
            db::conversations::mark_dispatched(
                &state.db,
                &message.id,
                MessageStatus::Failed,
                None,
                code.as_deref(),
            )
            .await?;
            message.status = MessageStatus::Failed;
            message.error_code = code;
            error!(
                conversation = %conversation.id,
                channel,
                error = %why,
                "outbound delivery failed"
            );
        }
        Err(other) => return Err(other),
    }

    Ok(message)
}

fn snippet(body: &str) -> String {
    if body.chars().count() <= SNIPPET_LEN {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(SNIPPET_LEN).collect();
        format!("{truncated}…")
    }
}
