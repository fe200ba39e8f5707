//! opsdesk is a small-business operations platform.
//!
//! A single-binary HTTP service covering the day-to-day of running a
//! small shop:
//!
//! - inventory and product management with low-stock alerts
//! - point-of-sale recording with revenue summaries and a team
//!   leaderboard
//! - team/collaborator management behind JWT auth
//! - multi-channel customer messaging (email, SMS, WhatsApp, web chat)
//!   with a rule-based chatbot and an LLM fallback
//! - lightweight sales and inventory forecasting
//! - live notification push over server-sent events
//!
//! # Architecture
//!
//! The system uses:
//! - axum for the REST surface
//! - SQLite (sqlx) for storage
//! - lettre for SMTP, the Twilio REST API for SMS/WhatsApp
//! - openai-api-rs for chatbot completions
//! - Tokio for the async runtime

pub mod ai;
pub mod api;
pub mod channels;
pub mod core;
pub mod db;
pub mod errors;
pub mod forecast;
pub mod inbound;
pub mod notify;
pub mod reports;

/// Configure structured logging with JSON output.
///
/// Sets up tracing-subscriber with an env-filter (`RUST_LOG`, defaulting
/// to `info`) and a JSON formatter. Call once at startup.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
