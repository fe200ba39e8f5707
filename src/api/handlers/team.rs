//! Team and collaborator management, plus the sales leaderboard.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::parse_period;
use super::sales::PeriodQuery;
use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::core::models::{NotificationKind, Role, Team, User, new_id};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::notify;
use crate::reports::{self, LeaderboardEntry};

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
    pub members: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub user: User,
    /// Handed to the collaborator out-of-band; also emailed when SMTP is
    /// configured.
    pub temporary_password: String,
}

pub async fn get(State(state): State<AppState>, caller: AuthUser) -> AppResult<Json<TeamResponse>> {
    let team = db::teams::find_by_id(&state.db, &caller.team_id)
        .await?
        .ok_or_else(|| AppError::not_found("team"))?;
    let members = db::users::list_by_team(&state.db, &caller.team_id).await?;
    Ok(Json(TeamResponse { team, members }))
}

/// Creates a collaborator account with a temporary password and emails
/// the invitation. Owner only.
pub async fn invite(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<InviteRequest>,
) -> AppResult<(StatusCode, Json<InviteResponse>)> {
    caller.require_owner()?;
    super::auth::validate_email(&request.email)?;
    if request.display_name.trim().is_empty() {
        return Err(AppError::validation("display name cannot be empty"));
    }

    let team = db::teams::find_by_id(&state.db, &caller.team_id)
        .await?
        .ok_or_else(|| AppError::not_found("team"))?;

    let temporary_password = new_id();
    let password_hash = bcrypt::hash(&temporary_password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;

    let user = User {
        id: new_id(),
        team_id: caller.team_id.clone(),
        email: request.email.trim().to_lowercase(),
        password_hash,
        display_name: request.display_name.trim().to_string(),
        role: Role::Collaborator,
        created_at: Utc::now(),
    };
    db::users::insert(&state.db, &user).await?;

    notify::emit(
        &state.db,
        &state.hub,
        &caller.team_id,
        None,
        NotificationKind::CollaboratorJoined,
        "New collaborator".to_string(),
        format!("{} joined {}", user.display_name, team.name),
    )
    .await?;

    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "invited",
        "user",
        &user.id,
        Some(user.email.clone()),
    )
    .await;

    // Invitation email is best-effort and must not hold up the response.
    if let Some(mailer) = state.channels.mailer().cloned() {
        let to = user.email.clone();
        let shop = team.name.clone();
        let password = temporary_password.clone();
        tokio::spawn(async move {
            let body = format!(
                "You've been invited to join {shop} on opsdesk.\n\n\
                 Sign in with this email address and the temporary password:\n{password}\n\n\
                 Please change it after your first login."
            );
            if let Err(e) = mailer.send(&to, &format!("Join {shop} on opsdesk"), &body).await {
                error!(to = %to, error = %e, "invitation email failed");
            }
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            user,
            temporary_password,
        }),
    ))
}

/// Removes a collaborator. Owner only; the owner cannot be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(member_id): Path<String>,
) -> AppResult<StatusCode> {
    caller.require_owner()?;

    let member = db::users::find_by_id(&state.db, &member_id)
        .await?
        .filter(|user| user.team_id == caller.team_id)
        .ok_or_else(|| AppError::not_found(format!("member {member_id}")))?;

    if member.role == Role::Owner {
        return Err(AppError::Forbidden(
            "the team owner cannot be removed".to_string(),
        ));
    }

    db::users::delete(&state.db, &caller.team_id, &member_id).await?;
    let _ = db::activities::record(
        &state.db,
        &caller.team_id,
        &caller.user_id,
        "removed",
        "user",
        &member_id,
        Some(member.email),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn leaderboard(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    let (_, cutoff) = parse_period(query.period.as_deref())?;
    let records = db::sales::records_since(&state.db, &caller.team_id, cutoff).await?;
    Ok(Json(reports::leaderboard(&records)))
}
