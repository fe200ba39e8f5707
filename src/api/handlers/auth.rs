//! Registration, login, and the current-user endpoint.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::auth::{AuthUser, issue_token};
use crate::api::state::AppState;
use crate::core::models::{Role, Team, User, new_id};
use crate::db;
use crate::errors::{AppError, AppResult};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub shop_name: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub team: Option<Team>,
}

/// Creates the shop (team) and its owner account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    if request.shop_name.trim().is_empty() {
        return Err(AppError::validation("shop name cannot be empty"));
    }
    if request.display_name.trim().is_empty() {
        return Err(AppError::validation("display name cannot be empty"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;

    let now = Utc::now();
    let owner_id = new_id();
    let team = Team {
        id: new_id(),
        name: request.shop_name.trim().to_string(),
        owner_id: owner_id.clone(),
        created_at: now,
    };
    let user = User {
        id: owner_id,
        team_id: team.id.clone(),
        email: request.email.trim().to_lowercase(),
        password_hash,
        display_name: request.display_name.trim().to_string(),
        role: Role::Owner,
        created_at: now,
    };

    db::teams::insert(&state.db, &team).await?;
    db::users::insert(&state.db, &user).await?;

    let _ = db::activities::record(
        &state.db,
        &team.id,
        &user.id,
        "registered",
        "team",
        &team.id,
        Some(team.name.clone()),
    )
    .await;

    let token = issue_token(&state.config.jwt_secret, &user)?;
    Ok(Json(AuthResponse {
        token,
        user,
        team: Some(team),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = request.email.trim().to_lowercase();
    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".to_string()))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("failed to verify password: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    let team = db::teams::find_by_id(&state.db, &user.team_id).await?;
    let token = issue_token(&state.config.jwt_secret, &user)?;
    Ok(Json(AuthResponse { token, user, team }))
}

pub async fn me(State(state): State<AppState>, caller: AuthUser) -> AppResult<Json<User>> {
    let user = db::users::find_by_id(&state.db, &caller.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user))
}

pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(AppError::validation(format!("invalid email: {email}")));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
