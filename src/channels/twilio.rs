//! Twilio SMS / WhatsApp channel.
//!
//! Drives the Twilio Messages REST endpoint directly with form-encoded
//! requests; inbound webhooks are authenticated with Twilio's HMAC-SHA1
//! signature scheme.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};
use tracing::{error, info};

use super::{DeliveryReceipt, Transport};
use crate::core::config::TwilioConfig;
use crate::errors::{AppError, AppResult};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

pub struct TwilioClient {
    account_sid: String,
    auth_token: String,
    sms_from: String,
    whatsapp_from: String,
}

impl TwilioClient {
    #[must_use]
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            sms_from: config.sms_from.clone(),
            whatsapp_from: config.whatsapp_from.clone(),
        }
    }

    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        Retry::spawn(strategy, operation).await
    }

    /// Sends one message over SMS or WhatsApp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] with the mapped Twilio error code
    /// when the API rejects the message.
    pub async fn send(&self, whatsapp: bool, to: &str, body: &str) -> AppResult<DeliveryReceipt> {
        let channel_name: &'static str = if whatsapp { "whatsapp" } else { "sms" };
        let (from, to) = if whatsapp {
            (
                ensure_whatsapp_prefix(&self.whatsapp_from),
                ensure_whatsapp_prefix(to),
            )
        } else {
            (self.sms_from.clone(), to.to_string())
        };

        let url = format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.account_sid
        );
        let params = [("To", to.as_str()), ("From", from.as_str()), ("Body", body)];

        // Retry covers transport failures only; a provider rejection is
        // parsed from the response below and never retried.
        let response = self
            .with_retry(|| async {
                HTTP_CLIENT
                    .post(&url)
                    .basic_auth(&self.account_sid, Some(&self.auth_token))
                    .form(&params)
                    .send()
                    .await
                    .map_err(AppError::from)
            })
            .await?;

        if response.status().is_success() {
            let parsed: MessageResponse = response.json().await?;
            info!(channel = channel_name, sid = %parsed.sid, "twilio message accepted");
            return Ok(DeliveryReceipt {
                provider_sid: Some(parsed.sid),
            });
        }

        let status = response.status();
        let body = response
            .json::<ErrorResponse>()
            .await
            .unwrap_or(ErrorResponse {
                code: None,
                message: None,
            });
        let message = body
            .code
            .and_then(describe_error_code)
            .map(ToString::to_string)
            .or(body.message)
            .unwrap_or_else(|| format!("twilio returned HTTP {status}"));
        error!(
            channel = channel_name,
            code = ?body.code,
            %message,
            "twilio rejected message"
        );
        Err(AppError::Channel {
            channel: channel_name,
            code: body.code.map(|c| c.to_string()),
            message,
        })
    }
}

/// Human-readable mapping for the Twilio error codes this platform
/// actually runs into.
#[must_use]
pub fn describe_error_code(code: i64) -> Option<&'static str> {
    match code {
        21211 => Some("the destination phone number is invalid"),
        21408 => Some("sending to this region is disabled on the account"),
        21610 => Some("the recipient has opted out of messages"),
        21614 => Some("the destination is not a valid mobile number"),
        63007 => Some("the WhatsApp sender is not provisioned"),
        63016 => Some("outside the WhatsApp session window; a template is required"),
        _ => None,
    }
}

fn ensure_whatsapp_prefix(address: &str) -> String {
    if address.starts_with("whatsapp:") {
        address.to_string()
    } else {
        format!("whatsapp:{address}")
    }
}

/// Validates the `X-Twilio-Signature` header: base64 HMAC-SHA1 over the
/// full webhook URL followed by the form parameters sorted by key.
#[must_use]
pub fn verify_webhook_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut payload = url.to_string();
    for (key, value) in sorted {
        payload.push_str(key);
        payload.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(payload.as_bytes());
    let expected = BASE64.encode(mac.finalize().into_bytes());

    if expected == signature {
        true
    } else {
        error!("twilio signature mismatch");
        false
    }
}

pub(super) struct TwilioTransport {
    client: Arc<TwilioClient>,
    whatsapp: bool,
}

impl TwilioTransport {
    pub(super) fn sms(client: Arc<TwilioClient>) -> Self {
        Self {
            client,
            whatsapp: false,
        }
    }

    pub(super) fn whatsapp(client: Arc<TwilioClient>) -> Self {
        Self {
            client,
            whatsapp: true,
        }
    }
}

#[async_trait]
impl Transport for TwilioTransport {
    async fn send_text(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt> {
        self.client.send(self.whatsapp, to, body).await
    }
}
