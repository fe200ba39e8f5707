use sqlx::SqlitePool;

use crate::core::models::Notification;
use crate::errors::AppResult;

pub async fn insert(pool: &SqlitePool, notification: &Notification) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO notifications
           (id, team_id, user_id, kind, title, body, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&notification.id)
    .bind(&notification.team_id)
    .bind(&notification.user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(notification.read)
    .bind(notification.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Notifications visible to a user: team-wide rows plus rows addressed to
/// them directly.
pub async fn list_for_user(
    pool: &SqlitePool,
    team_id: &str,
    user_id: &str,
    unread_only: bool,
) -> AppResult<Vec<Notification>> {
    let query = if unread_only {
        "SELECT * FROM notifications
         WHERE team_id = ?1 AND (user_id IS NULL OR user_id = ?2) AND read = 0
         ORDER BY created_at DESC"
    } else {
        "SELECT * FROM notifications
         WHERE team_id = ?1 AND (user_id IS NULL OR user_id = ?2)
         ORDER BY created_at DESC"
    };
    let notifications = sqlx::query_as::<_, Notification>(query)
        .bind(team_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(notifications)
}

pub async fn mark_read(pool: &SqlitePool, team_id: &str, id: &str) -> AppResult<bool> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?1 AND team_id = ?2")
        .bind(id)
        .bind(team_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &SqlitePool, team_id: &str, user_id: &str) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET read = 1
         WHERE team_id = ?1 AND (user_id IS NULL OR user_id = ?2) AND read = 0",
    )
    .bind(team_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
