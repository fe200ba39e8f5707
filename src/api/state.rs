//! Application state shared across all API handlers.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::ai::LlmClient;
use crate::channels::{ChannelRouter, Mailer, TwilioClient};
use crate::core::config::AppConfig;
use crate::errors::AppResult;
use crate::notify::NotificationHub;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub hub: Arc<NotificationHub>,
    pub channels: Arc<ChannelRouter>,
    pub llm: Option<Arc<LlmClient>>,
}

impl AppState {
    /// Builds the state from config, constructing whichever provider
    /// clients are configured.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured provider has unusable settings
    /// (for example an SMTP from-address that does not parse).
    pub fn new(db: SqlitePool, config: AppConfig) -> AppResult<Self> {
        let mailer = match &config.smtp {
            Some(smtp) => Some(Arc::new(Mailer::new(smtp)?)),
            None => None,
        };
        let twilio = config
            .twilio
            .as_ref()
            .map(|cfg| Arc::new(TwilioClient::new(cfg)));
        let llm = config
            .openai
            .as_ref()
            .map(|cfg| Arc::new(LlmClient::new(cfg)));

        Ok(Self {
            db,
            config: Arc::new(config),
            hub: Arc::new(NotificationHub::new()),
            channels: Arc::new(ChannelRouter::new(mailer, twilio)),
            llm,
        })
    }
}
