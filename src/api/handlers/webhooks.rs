//! Inbound Twilio webhook for SMS and WhatsApp.
//!
//! Each team points its Twilio number at its own team-scoped URL, so the
//! path identifies the shop. Requests are authenticated with Twilio's
//! signature header; when no public base URL is configured the check is
//! skipped with a warning (local development).

use axum::Form;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::channels::twilio::verify_webhook_signature;
use crate::core::models::Channel;
use crate::errors::{AppError, AppResult};
use crate::inbound::process_inbound;

const EMPTY_TWIML: &str = "<Response></Response>";

pub async fn twilio(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    let Some(client) = state.channels.twilio().cloned() else {
        return Err(AppError::Channel {
            channel: "sms",
            code: None,
            message: "twilio is not configured".to_string(),
        });
    };

    verify_signature(&state, client.auth_token(), &team_id, &headers, &params)?;

    let from = params
        .get("From")
        .map(String::as_str)
        .ok_or_else(|| AppError::validation("missing From parameter"))?;
    let body = params
        .get("Body")
        .map(String::as_str)
        .unwrap_or_default()
        .trim();
    if body.is_empty() {
        // Media-only messages are acknowledged and dropped.
        info!(team = %team_id, "ignoring inbound twilio message with empty body");
        return Ok(twiml_ok());
    }

    let (channel, address) = match from.strip_prefix("whatsapp:") {
        Some(number) => (Channel::Whatsapp, number),
        None => (Channel::Sms, from),
    };
    let profile_name = params.get("ProfileName").map(String::as_str);

    let outcome =
        process_inbound(&state, &team_id, channel, address, profile_name, body).await?;
    info!(
        team = %team_id,
        conversation = %outcome.conversation.id,
        channel = channel.as_str(),
        bot_replied = outcome.bot_reply.is_some(),
        "inbound twilio message processed"
    );

    Ok(twiml_ok())
}

fn verify_signature(
    state: &AppState,
    auth_token: &str,
    team_id: &str,
    headers: &HeaderMap,
    params: &HashMap<String, String>,
) -> AppResult<()> {
    let Some(base_url) = state.config.public_base_url.as_deref() else {
        warn!("PUBLIC_BASE_URL unset; skipping twilio signature verification");
        return Ok(());
    };

    let signature = headers
        .get("X-Twilio-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing X-Twilio-Signature".to_string()))?;

    let url = format!(
        "{}/api/v1/webhooks/twilio/{team_id}",
        base_url.trim_end_matches('/')
    );
    let pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if !verify_webhook_signature(auth_token, &url, &pairs, signature) {
        return Err(AppError::Unauthorized(
            "invalid twilio signature".to_string(),
        ));
    }
    Ok(())
}

fn twiml_ok() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        EMPTY_TWIML,
    )
}
