use sqlx::SqlitePool;

use crate::core::models::User;
use crate::errors::{AppError, AppResult};

pub async fn insert(pool: &SqlitePool, user: &User) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO users (id, team_id, email, password_hash, display_name, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&user.id)
    .bind(&user.team_id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.display_name)
    .bind(user.role)
    .bind(user.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            AppError::Conflict(format!("email already registered: {}", user.email))
        } else {
            AppError::Database(e)
        }
    })?;
    Ok(())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn list_by_team(pool: &SqlitePool, team_id: &str) -> AppResult<Vec<User>> {
    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE team_id = ?1 ORDER BY created_at")
            .bind(team_id)
            .fetch_all(pool)
            .await?;
    Ok(users)
}

/// Deletes a team member; returns false when no row matched.
pub async fn delete(pool: &SqlitePool, team_id: &str, user_id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1 AND team_id = ?2")
        .bind(user_id)
        .bind(team_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
