use std::env;

/// Top-level runtime configuration, read once at startup.
///
/// Provider credentials are optional: a missing provider disables the
/// corresponding channel but never prevents the server from starting.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub public_base_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub twilio: Option<TwilioConfig>,
    pub openai: Option<OpenAiConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub sms_from: String,
    pub whatsapp_from: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://opsdesk.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret: env::var("JWT_SECRET").map_err(|e| format!("JWT_SECRET: {e}"))?,
            public_base_url: match env::var("PUBLIC_BASE_URL") {
                Ok(raw) => {
                    // Webhook signature checks reconstruct URLs from this
                    // value; reject garbage at startup.
                    url::Url::parse(&raw).map_err(|e| format!("PUBLIC_BASE_URL: {e}"))?;
                    Some(raw.trim_end_matches('/').to_string())
                }
                Err(_) => None,
            },
            smtp: SmtpConfig::from_env()?,
            twilio: TwilioConfig::from_env()?,
            openai: OpenAiConfig::from_env(),
        })
    }
}

impl SmtpConfig {
    /// Returns `None` when SMTP_HOST is unset; errors when the provider is
    /// only partially configured.
    fn from_env() -> Result<Option<Self>, String> {
        let Ok(host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let port = match env::var("SMTP_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| format!("SMTP_PORT: {e}"))?,
            Err(_) => 465,
        };
        Ok(Some(Self {
            host,
            port,
            username: env::var("SMTP_USERNAME").map_err(|e| format!("SMTP_USERNAME: {e}"))?,
            password: env::var("SMTP_PASSWORD").map_err(|e| format!("SMTP_PASSWORD: {e}"))?,
            from_address: env::var("SMTP_FROM").map_err(|e| format!("SMTP_FROM: {e}"))?,
        }))
    }
}

impl TwilioConfig {
    fn from_env() -> Result<Option<Self>, String> {
        let Ok(account_sid) = env::var("TWILIO_ACCOUNT_SID") else {
            return Ok(None);
        };
        Ok(Some(Self {
            account_sid,
            auth_token: env::var("TWILIO_AUTH_TOKEN")
                .map_err(|e| format!("TWILIO_AUTH_TOKEN: {e}"))?,
            sms_from: env::var("TWILIO_SMS_FROM").map_err(|e| format!("TWILIO_SMS_FROM: {e}"))?,
            whatsapp_from: env::var("TWILIO_WHATSAPP_FROM")
                .map_err(|e| format!("TWILIO_WHATSAPP_FROM: {e}"))?,
        }))
    }
}

impl OpenAiConfig {
    fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        Some(Self {
            api_key,
            model: env::var("OPENAI_MODEL").ok(),
        })
    }
}
