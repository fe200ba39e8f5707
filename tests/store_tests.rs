//! Storage-layer tests against an in-memory SQLite database.

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use opsdesk::core::models::{
    Author, Channel, Direction, MessageStatus, NotificationKind, Product, Role, Team, User, new_id,
};
use opsdesk::db;
use opsdesk::errors::AppError;
use opsdesk::notify::{self, NotificationHub};

async fn test_pool() -> SqlitePool {
    // A single connection: every pooled connection would otherwise get
    // its own empty in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db::migrate(&pool).await.expect("migrations apply");
    pool
}

async fn seed_team(pool: &SqlitePool) -> (Team, User) {
    let now = Utc::now();
    let owner_id = new_id();
    let team = Team {
        id: new_id(),
        name: "Corner Roasters".to_string(),
        owner_id: owner_id.clone(),
        created_at: now,
    };
    let owner = User {
        id: owner_id,
        team_id: team.id.clone(),
        email: format!("{}@example.com", new_id()),
        password_hash: "not-a-real-hash".to_string(),
        display_name: "Alex".to_string(),
        role: Role::Owner,
        created_at: now,
    };
    db::teams::insert(pool, &team).await.expect("insert team");
    db::users::insert(pool, &owner).await.expect("insert owner");
    (team, owner)
}

fn product(team_id: &str, name: &str, quantity: i64, min_threshold: i64) -> Product {
    let now = Utc::now();
    Product {
        id: new_id(),
        team_id: team_id.to_string(),
        name: name.to_string(),
        sku: format!("sku-{}", new_id()),
        description: None,
        price_cents: 1250,
        quantity,
        min_threshold,
        low_stock_alert: quantity <= min_threshold,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_product_roundtrip() {
    let pool = test_pool().await;
    let (team, _) = seed_team(&pool).await;

    let created = product(&team.id, "Blue Mug", 10, 3);
    db::products::insert(&pool, &created).await.expect("insert");

    let found = db::products::find(&pool, &team.id, &created.id)
        .await
        .expect("query")
        .expect("product exists");
    assert_eq!(found.name, "Blue Mug");
    assert_eq!(found.quantity, 10);
    assert!(!found.low_stock_alert);

    // Scoped to the owning team.
    let missing = db::products::find(&pool, "other-team", &created.id)
        .await
        .expect("query");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_sku_is_a_conflict() {
    let pool = test_pool().await;
    let (team, _) = seed_team(&pool).await;

    let mut first = product(&team.id, "Mug", 5, 1);
    first.sku = "MUG-1".to_string();
    db::products::insert(&pool, &first).await.expect("insert");

    let mut second = product(&team.id, "Other Mug", 5, 1);
    second.sku = "MUG-1".to_string();
    let err = db::products::insert(&pool, &second)
        .await
        .expect_err("duplicate sku must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_sale_decrements_stock_and_flags_low_stock_once() {
    let pool = test_pool().await;
    let (team, owner) = seed_team(&pool).await;

    let item = product(&team.id, "Beans", 5, 3);
    db::products::insert(&pool, &item).await.expect("insert");

    // 5 -> 4: above threshold, no crossing.
    let first = db::sales::record(&pool, &team.id, &owner.id, &item.id, 1)
        .await
        .expect("record sale");
    assert_eq!(first.product.quantity, 4);
    assert_eq!(first.sale.total_cents, 1250);
    assert!(!first.crossed_low_stock);

    // 4 -> 2: crosses the threshold of 3.
    let second = db::sales::record(&pool, &team.id, &owner.id, &item.id, 2)
        .await
        .expect("record sale");
    assert_eq!(second.product.quantity, 2);
    assert!(second.product.low_stock_alert);
    assert!(second.crossed_low_stock);

    // 2 -> 1: already flagged, no second alert.
    let third = db::sales::record(&pool, &team.id, &owner.id, &item.id, 1)
        .await
        .expect("record sale");
    assert!(!third.crossed_low_stock);
}

#[tokio::test]
async fn test_overselling_is_rejected_and_rolled_back() {
    let pool = test_pool().await;
    let (team, owner) = seed_team(&pool).await;

    let item = product(&team.id, "Beans", 2, 0);
    db::products::insert(&pool, &item).await.expect("insert");

    let err = db::sales::record(&pool, &team.id, &owner.id, &item.id, 3)
        .await
        .expect_err("overselling must fail");
    assert!(matches!(err, AppError::Conflict(_)));

    // Stock is untouched and no sale row exists.
    let unchanged = db::products::find(&pool, &team.id, &item.id)
        .await
        .expect("query")
        .expect("product exists");
    assert_eq!(unchanged.quantity, 2);
    let sales = db::sales::list(&pool, &team.id, 10).await.expect("list");
    assert!(sales.is_empty());
}

#[tokio::test]
async fn test_restock_clears_low_stock_alert() {
    let pool = test_pool().await;
    let (team, _) = seed_team(&pool).await;

    let item = product(&team.id, "Beans", 1, 3);
    db::products::insert(&pool, &item).await.expect("insert");
    assert!(item.low_stock_alert);

    let restocked = db::products::restock(&pool, &team.id, &item.id, 10)
        .await
        .expect("restock")
        .expect("product exists");
    assert_eq!(restocked.quantity, 11);
    assert!(!restocked.low_stock_alert);

    let low = db::products::list_low_stock(&pool, &team.id)
        .await
        .expect("list");
    assert!(low.is_empty());
}

#[tokio::test]
async fn test_sale_history_survives_product_deletion() {
    let pool = test_pool().await;
    let (team, owner) = seed_team(&pool).await;

    let item = product(&team.id, "Seasonal Mug", 5, 0);
    db::products::insert(&pool, &item).await.expect("insert");
    db::sales::record(&pool, &team.id, &owner.id, &item.id, 2)
        .await
        .expect("record sale");

    assert!(
        db::products::delete(&pool, &team.id, &item.id)
            .await
            .expect("delete")
    );

    let cutoff = Utc::now() - chrono::Duration::days(1);
    let records = db::sales::records_since(&pool, &team.id, cutoff)
        .await
        .expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_name, "(deleted product)");
    assert_eq!(records[0].seller_name, "Alex");
}

#[tokio::test]
async fn test_conversation_upsert_is_keyed_by_address() {
    let pool = test_pool().await;
    let (team, _) = seed_team(&pool).await;

    let first = db::conversations::upsert(&pool, &team.id, Channel::Sms, "+15551234567", None)
        .await
        .expect("upsert");
    let second =
        db::conversations::upsert(&pool, &team.id, Channel::Sms, "+15551234567", Some("Sam"))
            .await
            .expect("upsert");
    assert_eq!(first.id, second.id);

    // A different channel for the same address is a separate thread.
    let whatsapp =
        db::conversations::upsert(&pool, &team.id, Channel::Whatsapp, "+15551234567", None)
            .await
            .expect("upsert");
    assert_ne!(first.id, whatsapp.id);
}

#[tokio::test]
async fn test_messages_append_and_dispatch_marking() {
    let pool = test_pool().await;
    let (team, _) = seed_team(&pool).await;

    let conversation = db::conversations::upsert(&pool, &team.id, Channel::Web, "session-1", None)
        .await
        .expect("upsert");

    db::conversations::append_message(
        &pool,
        &conversation.id,
        Direction::Inbound,
        Author::Customer,
        "hello?",
        MessageStatus::Received,
    )
    .await
    .expect("append inbound");

    let outbound = db::conversations::append_message(
        &pool,
        &conversation.id,
        Direction::Outbound,
        Author::Agent,
        "hi, how can we help?",
        MessageStatus::Queued,
    )
    .await
    .expect("append outbound");

    db::conversations::mark_dispatched(
        &pool,
        &outbound.id,
        MessageStatus::Failed,
        None,
        Some("21211"),
    )
    .await
    .expect("mark");

    let messages = db::conversations::list_messages(&pool, &conversation.id)
        .await
        .expect("list");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].status, MessageStatus::Failed);
    assert_eq!(messages[1].error_code.as_deref(), Some("21211"));

    let refreshed = db::conversations::find(&pool, &team.id, &conversation.id)
        .await
        .expect("query")
        .expect("conversation exists");
    assert!(refreshed.last_message_at >= conversation.last_message_at);
}

#[tokio::test]
async fn test_notification_emit_persists_and_broadcasts() {
    let pool = test_pool().await;
    let (team, owner) = seed_team(&pool).await;

    let hub = NotificationHub::new();
    let mut receiver = hub.subscribe(&team.id);

    let emitted = notify::emit(
        &pool,
        &hub,
        &team.id,
        None,
        NotificationKind::LowStock,
        "Low stock: Beans",
        "Beans is down to 2 (threshold 3)",
    )
    .await
    .expect("emit");

    let pushed = receiver.recv().await.expect("live notification");
    assert_eq!(pushed.id, emitted.id);
    assert_eq!(pushed.kind, NotificationKind::LowStock);

    let listed = db::notifications::list_for_user(&pool, &team.id, &owner.id, true)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].read);

    let marked = db::notifications::mark_all_read(&pool, &team.id, &owner.id)
        .await
        .expect("mark all");
    assert_eq!(marked, 1);

    let unread = db::notifications::list_for_user(&pool, &team.id, &owner.id, true)
        .await
        .expect("list");
    assert!(unread.is_empty());
}

#[tokio::test]
async fn test_activity_feed_is_newest_first() {
    let pool = test_pool().await;
    let (team, owner) = seed_team(&pool).await;

    for verb in ["created", "restocked", "deleted"] {
        db::activities::record(&pool, &team.id, &owner.id, verb, "product", "p-1", None)
            .await
            .expect("record");
    }

    let feed = db::activities::list(&pool, &team.id, 10).await.expect("list");
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].verb, "deleted");
    assert_eq!(feed[2].verb, "created");
}
