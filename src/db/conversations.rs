use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::models::{Author, Channel, Conversation, Direction, Message, MessageStatus, new_id};
use crate::errors::AppResult;

/// Finds the conversation for (team, channel, customer address), creating
/// it when this is the first contact. Inbound traffic is keyed this way so
/// repeat customers land in the same thread.
pub async fn upsert(
    pool: &SqlitePool,
    team_id: &str,
    channel: Channel,
    customer_address: &str,
    customer_name: Option<&str>,
) -> AppResult<Conversation> {
    if let Some(existing) = find_by_address(pool, team_id, channel, customer_address).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let conversation = Conversation {
        id: new_id(),
        team_id: team_id.to_string(),
        channel,
        customer_name: customer_name.map(ToString::to_string),
        customer_address: customer_address.to_string(),
        bot_enabled: true,
        created_at: now,
        last_message_at: now,
    };

    sqlx::query(
        "INSERT INTO conversations
           (id, team_id, channel, customer_name, customer_address,
            bot_enabled, created_at, last_message_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&conversation.id)
    .bind(&conversation.team_id)
    .bind(conversation.channel)
    .bind(&conversation.customer_name)
    .bind(&conversation.customer_address)
    .bind(conversation.bot_enabled)
    .bind(conversation.created_at)
    .bind(conversation.last_message_at)
    .execute(pool)
    .await?;

    Ok(conversation)
}

pub async fn find_by_address(
    pool: &SqlitePool,
    team_id: &str,
    channel: Channel,
    customer_address: &str,
) -> AppResult<Option<Conversation>> {
    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations
         WHERE team_id = ?1 AND channel = ?2 AND customer_address = ?3",
    )
    .bind(team_id)
    .bind(channel)
    .bind(customer_address)
    .fetch_optional(pool)
    .await?;
    Ok(conversation)
}

pub async fn list(pool: &SqlitePool, team_id: &str) -> AppResult<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE team_id = ?1 ORDER BY last_message_at DESC",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(conversations)
}

pub async fn find(pool: &SqlitePool, team_id: &str, id: &str) -> AppResult<Option<Conversation>> {
    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE id = ?1 AND team_id = ?2",
    )
    .bind(id)
    .bind(team_id)
    .fetch_optional(pool)
    .await?;
    Ok(conversation)
}

pub async fn set_bot_enabled(
    pool: &SqlitePool,
    team_id: &str,
    id: &str,
    enabled: bool,
) -> AppResult<bool> {
    let result =
        sqlx::query("UPDATE conversations SET bot_enabled = ?1 WHERE id = ?2 AND team_id = ?3")
            .bind(enabled)
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Appends a message and bumps the conversation's last-activity stamp.
pub async fn append_message(
    pool: &SqlitePool,
    conversation_id: &str,
    direction: Direction,
    author: Author,
    body: &str,
    status: MessageStatus,
) -> AppResult<Message> {
    let message = Message {
        id: new_id(),
        conversation_id: conversation_id.to_string(),
        direction,
        author,
        body: body.to_string(),
        status,
        provider_sid: None,
        error_code: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO messages
           (id, conversation_id, direction, author, body, status,
            provider_sid, error_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&message.id)
    .bind(&message.conversation_id)
    .bind(message.direction)
    .bind(message.author)
    .bind(&message.body)
    .bind(message.status)
    .bind(&message.provider_sid)
    .bind(&message.error_code)
    .bind(message.created_at)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE conversations SET last_message_at = ?1 WHERE id = ?2")
        .bind(message.created_at)
        .bind(conversation_id)
        .execute(pool)
        .await?;

    Ok(message)
}

pub async fn list_messages(pool: &SqlitePool, conversation_id: &str) -> AppResult<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY created_at",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

/// Most recent messages, oldest-first, used as chatbot context.
pub async fn recent_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
) -> AppResult<Vec<Message>> {
    let mut messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY created_at DESC LIMIT ?2",
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    messages.reverse();
    Ok(messages)
}

/// Records the provider outcome of an outbound send.
pub async fn mark_dispatched(
    pool: &SqlitePool,
    message_id: &str,
    status: MessageStatus,
    provider_sid: Option<&str>,
    error_code: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE messages SET status = ?1, provider_sid = ?2, error_code = ?3 WHERE id = ?4",
    )
    .bind(status)
    .bind(provider_sid)
    .bind(error_code)
    .bind(message_id)
    .execute(pool)
    .await?;
    Ok(())
}
