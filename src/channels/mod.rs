//! Outbound messaging channels.
//!
//! Each provider client lives in its own module; [`ChannelRouter`] picks
//! the transport for a conversation's channel. Web chat has no external
//! provider, the customer polls the public endpoint for replies.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::models::Channel;
use crate::errors::{AppError, AppResult};

pub mod email;
pub mod twilio;

pub use email::Mailer;
pub use twilio::TwilioClient;

/// What a provider reported back for one outbound message.
#[derive(Debug, Default, Clone)]
pub struct DeliveryReceipt {
    pub provider_sid: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers one plain-text message to the customer address.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] with the mapped provider code when
    /// the provider rejects the send.
    async fn send_text(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt>;
}

/// Resolves a conversation channel to its configured transport.
#[derive(Clone, Default)]
pub struct ChannelRouter {
    mailer: Option<Arc<Mailer>>,
    twilio: Option<Arc<TwilioClient>>,
}

impl ChannelRouter {
    #[must_use]
    pub fn new(mailer: Option<Arc<Mailer>>, twilio: Option<Arc<TwilioClient>>) -> Self {
        Self { mailer, twilio }
    }

    #[must_use]
    pub fn mailer(&self) -> Option<&Arc<Mailer>> {
        self.mailer.as_ref()
    }

    #[must_use]
    pub fn twilio(&self) -> Option<&Arc<TwilioClient>> {
        self.twilio.as_ref()
    }

    fn transport(&self, channel: Channel) -> Option<Box<dyn Transport>> {
        match channel {
            Channel::Email => self
                .mailer
                .clone()
                .map(|mailer| Box::new(email::EmailTransport::new(mailer)) as Box<dyn Transport>),
            Channel::Sms => self
                .twilio
                .clone()
                .map(|client| {
                    Box::new(twilio::TwilioTransport::sms(client)) as Box<dyn Transport>
                }),
            Channel::Whatsapp => self
                .twilio
                .clone()
                .map(|client| {
                    Box::new(twilio::TwilioTransport::whatsapp(client)) as Box<dyn Transport>
                }),
            // Web chat messages are stored and fetched by the customer;
            // there is nothing to hand to a provider.
            Channel::Web => Some(Box::new(WebTransport)),
        }
    }

    /// Sends `body` to `to` over `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] when the channel's provider is not
    /// configured or the provider rejects the send.
    pub async fn dispatch(
        &self,
        channel: Channel,
        to: &str,
        body: &str,
    ) -> AppResult<DeliveryReceipt> {
        let transport = self.transport(channel).ok_or_else(|| AppError::Channel {
            channel: channel.as_str(),
            code: None,
            message: format!("{} provider is not configured", channel.as_str()),
        })?;
        transport.send_text(to, body).await
    }
}

struct WebTransport;

#[async_trait]
impl Transport for WebTransport {
    async fn send_text(&self, _to: &str, _body: &str) -> AppResult<DeliveryReceipt> {
        Ok(DeliveryReceipt::default())
    }
}
