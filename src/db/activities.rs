use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::models::{Activity, new_id};
use crate::errors::AppResult;

/// Appends an audit entry. Failures are the caller's business: most call
/// sites log and move on rather than failing the originating request.
pub async fn record(
    pool: &SqlitePool,
    team_id: &str,
    actor_id: &str,
    verb: &str,
    object_kind: &str,
    object_id: &str,
    detail: Option<String>,
) -> AppResult<Activity> {
    let activity = Activity {
        id: new_id(),
        team_id: team_id.to_string(),
        actor_id: actor_id.to_string(),
        verb: verb.to_string(),
        object_kind: object_kind.to_string(),
        object_id: object_id.to_string(),
        detail,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO activities
           (id, team_id, actor_id, verb, object_kind, object_id, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&activity.id)
    .bind(&activity.team_id)
    .bind(&activity.actor_id)
    .bind(&activity.verb)
    .bind(&activity.object_kind)
    .bind(&activity.object_id)
    .bind(&activity.detail)
    .bind(activity.created_at)
    .execute(pool)
    .await?;

    Ok(activity)
}

pub async fn list(pool: &SqlitePool, team_id: &str, limit: i64) -> AppResult<Vec<Activity>> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE team_id = ?1 ORDER BY created_at DESC LIMIT ?2",
    )
    .bind(team_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(activities)
}
