//! Chatbot reply engine.
//!
//! Inbound customer messages on bot-enabled conversations run through the
//! rule table first; anything the rules cannot answer goes to the LLM
//! with the shop's catalog as context. When the LLM is unconfigured or
//! fails, the customer still gets the static fallback line.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::core::models::{Author, Conversation, Team};
use crate::db;
use crate::errors::AppResult;

pub mod client;
pub mod rules;

pub use client::{ChatTurn, LlmClient};
pub use rules::Intent;

pub const FALLBACK_REPLY: &str =
    "Thanks for reaching out! A member of our team will get back to you shortly.";

const HANDOFF_REPLY: &str =
    "Of course — I've flagged this conversation for the team, someone will be with you soon.";

/// How many prior messages the LLM sees.
const HISTORY_LIMIT: i64 = 10;

/// How many catalog lines the LLM prompt carries.
const CATALOG_LIMIT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Rules,
    Llm,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct BotReply {
    pub body: String,
    pub source: ReplySource,
}

/// Produces the bot's reply to an inbound message, or `None` when the
/// conversation has auto-replies switched off.
///
/// A human-handoff request also switches the bot off for the
/// conversation so the next customer message is left for the team.
///
/// # Errors
///
/// Returns an error only for storage failures; provider/LLM trouble
/// degrades to [`FALLBACK_REPLY`].
pub async fn generate_reply(
    pool: &SqlitePool,
    llm: Option<&LlmClient>,
    team: &Team,
    conversation: &Conversation,
    inbound: &str,
) -> AppResult<Option<BotReply>> {
    if !conversation.bot_enabled {
        return Ok(None);
    }

    match rules::classify(inbound) {
        Some(Intent::Greeting) => {
            return Ok(Some(rule_reply(format!(
                "Hi there! Welcome to {} — how can we help you today?",
                team.name
            ))));
        }
        Some(Intent::Thanks) => {
            return Ok(Some(rule_reply(
                "You're very welcome! Anything else we can help with?".to_string(),
            )));
        }
        Some(Intent::HumanHandoff) => {
            db::conversations::set_bot_enabled(pool, &team.id, &conversation.id, false).await?;
            return Ok(Some(rule_reply(HANDOFF_REPLY.to_string())));
        }
        Some(Intent::PriceQuery { product }) => {
            if let Some(found) = db::products::find_by_name(pool, &team.id, &product).await? {
                return Ok(Some(rule_reply(format!(
                    "{} is {}.",
                    found.name,
                    format_cents(found.price_cents)
                ))));
            }
            // Unknown product: let the model take a shot with the catalog.
        }
        Some(Intent::StockQuery { product }) => {
            if let Some(found) = db::products::find_by_name(pool, &team.id, &product).await? {
                let body = if found.quantity > 0 {
                    format!("Yes — we have {} of {} in stock.", found.quantity, found.name)
                } else {
                    format!("{} is currently out of stock, sorry!", found.name)
                };
                return Ok(Some(rule_reply(body)));
            }
        }
        None => {}
    }

    let Some(llm) = llm else {
        return Ok(Some(BotReply {
            body: FALLBACK_REPLY.to_string(),
            source: ReplySource::Fallback,
        }));
    };

    let system_prompt = build_system_prompt(pool, team).await?;
    let turns = history_turns(pool, &conversation.id).await?;

    match llm.complete(&system_prompt, &turns).await {
        Ok(body) => Ok(Some(BotReply {
            body,
            source: ReplySource::Llm,
        })),
        Err(e) => {
            warn!(conversation = %conversation.id, error = %e, "llm reply failed, using fallback");
            Ok(Some(BotReply {
                body: FALLBACK_REPLY.to_string(),
                source: ReplySource::Fallback,
            }))
        }
    }
}

fn rule_reply(body: String) -> BotReply {
    BotReply {
        body,
        source: ReplySource::Rules,
    }
}

async fn build_system_prompt(pool: &SqlitePool, team: &Team) -> AppResult<String> {
    let products = db::products::list(pool, &team.id).await?;
    let mut catalog = String::new();
    for product in products.iter().take(CATALOG_LIMIT) {
        catalog.push_str(&format!(
            "- {} — {} ({} in stock)\n",
            product.name,
            format_cents(product.price_cents),
            product.quantity
        ));
    }
    if catalog.is_empty() {
        catalog.push_str("(no catalog available)\n");
    }

    Ok(format!(
        "You are the assistant for {name}, a small shop. \
         Answer customer questions briefly and politely. \
         Only state prices and stock levels that appear in the catalog below; \
         if you do not know, say a teammate will follow up. \
         Never invent discounts or delivery promises.\n\nCatalog:\n{catalog}",
        name = team.name,
    ))
}

async fn history_turns(pool: &SqlitePool, conversation_id: &str) -> AppResult<Vec<ChatTurn>> {
    let history = db::conversations::recent_messages(pool, conversation_id, HISTORY_LIMIT).await?;
    Ok(history
        .into_iter()
        .map(|message| ChatTurn {
            from_customer: message.author == Author::Customer,
            text: message.body,
        })
        .collect())
}

/// Formats integer cents as a dollar amount, e.g. `1250 -> "$12.50"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}
