use sqlx::SqlitePool;

use crate::core::models::Team;
use crate::errors::AppResult;

pub async fn insert(pool: &SqlitePool, team: &Team) -> AppResult<()> {
    sqlx::query("INSERT INTO teams (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&team.id)
        .bind(&team.name)
        .bind(&team.owner_id)
        .bind(team.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}
