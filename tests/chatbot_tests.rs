//! Reply-engine tests: rules resolve against the catalog, handoff parks
//! the bot, and everything else degrades to the fallback line when no
//! LLM is configured.

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use opsdesk::ai::{self, FALLBACK_REPLY, ReplySource};
use opsdesk::core::models::{Channel, Product, Role, Team, User, new_id};
use opsdesk::db;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db::migrate(&pool).await.expect("migrations apply");
    pool
}

async fn seed(pool: &SqlitePool) -> Team {
    let now = Utc::now();
    let owner_id = new_id();
    let team = Team {
        id: new_id(),
        name: "Corner Roasters".to_string(),
        owner_id: owner_id.clone(),
        created_at: now,
    };
    db::teams::insert(pool, &team).await.expect("insert team");
    db::users::insert(
        pool,
        &User {
            id: owner_id,
            team_id: team.id.clone(),
            email: "owner@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: "Alex".to_string(),
            role: Role::Owner,
            created_at: now,
        },
    )
    .await
    .expect("insert owner");

    db::products::insert(
        pool,
        &Product {
            id: new_id(),
            team_id: team.id.clone(),
            name: "Blue Mug".to_string(),
            sku: "MUG-BLUE".to_string(),
            description: None,
            price_cents: 1499,
            quantity: 7,
            min_threshold: 2,
            low_stock_alert: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert product");
    db::products::insert(
        pool,
        &Product {
            id: new_id(),
            team_id: team.id.clone(),
            name: "Espresso Beans".to_string(),
            sku: "BEANS-1".to_string(),
            description: None,
            price_cents: 2200,
            quantity: 0,
            min_threshold: 5,
            low_stock_alert: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert product");

    team
}

#[tokio::test]
async fn test_greeting_mentions_the_shop() {
    let pool = test_pool().await;
    let team = seed(&pool).await;
    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "s-1", None)
        .await
        .expect("upsert");

    let reply = ai::generate_reply(&pool, None, &team, &conversation, "hello!")
        .await
        .expect("reply")
        .expect("bot is enabled");
    assert_eq!(reply.source, ReplySource::Rules);
    assert!(reply.body.contains("Corner Roasters"));
}

#[tokio::test]
async fn test_price_query_reads_the_catalog() {
    let pool = test_pool().await;
    let team = seed(&pool).await;
    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "s-1", None)
        .await
        .expect("upsert");

    let reply = ai::generate_reply(&pool, None, &team, &conversation, "how much is the blue mug?")
        .await
        .expect("reply")
        .expect("bot is enabled");
    assert_eq!(reply.source, ReplySource::Rules);
    assert!(reply.body.contains("$14.99"), "got: {}", reply.body);
}

#[tokio::test]
async fn test_stock_query_reports_out_of_stock() {
    let pool = test_pool().await;
    let team = seed(&pool).await;
    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "s-1", None)
        .await
        .expect("upsert");

    let reply = ai::generate_reply(
        &pool,
        None,
        &team,
        &conversation,
        "do you have espresso beans in stock?",
    )
    .await
    .expect("reply")
    .expect("bot is enabled");
    assert_eq!(reply.source, ReplySource::Rules);
    assert!(reply.body.contains("out of stock"), "got: {}", reply.body);
}

#[tokio::test]
async fn test_handoff_parks_the_bot() {
    let pool = test_pool().await;
    let team = seed(&pool).await;
    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "s-1", None)
        .await
        .expect("upsert");

    let reply = ai::generate_reply(&pool, None, &team, &conversation, "I want to speak to someone")
        .await
        .expect("reply")
        .expect("bot was enabled");
    assert_eq!(reply.source, ReplySource::Rules);

    let parked = db::conversations::find(&pool, &team.id, &conversation.id)
        .await
        .expect("query")
        .expect("conversation exists");
    assert!(!parked.bot_enabled);

    // The next message is left for the team.
    let silent = ai::generate_reply(&pool, None, &team, &parked, "anyone there?")
        .await
        .expect("reply");
    assert!(silent.is_none());
}

#[tokio::test]
async fn test_unknown_question_without_llm_uses_fallback() {
    let pool = test_pool().await;
    let team = seed(&pool).await;
    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "s-1", None)
        .await
        .expect("upsert");

    let reply = ai::generate_reply(
        &pool,
        None,
        &team,
        &conversation,
        "can I return an order from last week?",
    )
    .await
    .expect("reply")
    .expect("bot is enabled");
    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.body, FALLBACK_REPLY);
}

#[test]
fn test_format_cents() {
    assert_eq!(ai::format_cents(1499), "$14.99");
    assert_eq!(ai::format_cents(100), "$1.00");
    assert_eq!(ai::format_cents(5), "$0.05");
    assert_eq!(ai::format_cents(0), "$0.00");
}
