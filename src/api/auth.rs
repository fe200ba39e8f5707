//! JWT issuing and the authenticated-user extractor.
//!
//! Every protected handler takes an [`AuthUser`] argument; extraction
//! verifies the bearer token and scopes the request to the caller's team.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::core::models::{Role, User};
use crate::errors::{AppError, AppResult};

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Team id the token is scoped to.
    pub team: String,
    pub role: String,
    pub exp: i64,
}

/// # Errors
///
/// Returns an error when signing fails.
pub fn issue_token(jwt_secret: &str, user: &User) -> AppResult<String> {
    let claims = Claims {
        sub: user.id.clone(),
        team: user.team_id.clone(),
        role: user.role.as_str().to_string(),
        exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to issue token: {e}")))
}

/// The verified caller, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub team_id: String,
    pub role: Role,
}

impl AuthUser {
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is the team
    /// owner.
    pub fn require_owner(&self) -> AppResult<()> {
        if self.is_owner() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "this action requires the team owner".to_string(),
            ))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("invalid token: {e}")))?;

        let role = Role::parse(&data.claims.role)
            .ok_or_else(|| AppError::Unauthorized("unknown role in token".to_string()))?;

        Ok(AuthUser {
            user_id: data.claims.sub,
            team_id: data.claims.team,
            role,
        })
    }
}
