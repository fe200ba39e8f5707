//! End-to-end API tests: the full router against an in-memory database,
//! no external providers configured.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use opsdesk::api::routes::router;
use opsdesk::api::state::AppState;
use opsdesk::core::config::AppConfig;
use opsdesk::db;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db::migrate(&pool).await.expect("migrations apply");

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "test-secret".to_string(),
        public_base_url: None,
        smtp: None,
        twilio: None,
        openai: None,
    };
    let state = AppState::new(pool, config).expect("build state");
    router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "shop_name": "Corner Roasters",
            "display_name": "Alex",
            "email": "alex@example.com",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().expect("token in response").to_string()
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = test_app().await;
    let (status, _) = send(&app, "GET", "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/products", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = test_app().await;
    let token = register(&app).await;

    let (status, me) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alex@example.com");
    assert_eq!(me["role"], "owner");
    assert!(me.get("password_hash").is_none(), "hash must not leak");

    let (status, login) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "alex@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(login["token"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "alex@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pos_flow_inventory_summary_and_notifications() {
    let app = test_app().await;
    let token = register(&app).await;

    let (status, product) = send(
        &app,
        "POST",
        "/api/v1/products",
        Some(&token),
        Some(json!({
            "name": "Blue Mug",
            "sku": "MUG-BLUE",
            "price_cents": 1499,
            "quantity": 4,
            "min_threshold": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {product}");
    let product_id = product["id"].as_str().expect("product id").to_string();

    // Sell 3 of 4: crosses the threshold of 2.
    let (status, sale) = send(
        &app,
        "POST",
        "/api/v1/sales",
        Some(&token),
        Some(json!({ "product_id": product_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "sale failed: {sale}");
    assert_eq!(sale["sale"]["total_cents"], 4497);
    assert_eq!(sale["product"]["quantity"], 1);
    assert_eq!(sale["product"]["low_stock_alert"], true);

    // Overselling is a 409.
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/sales",
        Some(&token),
        Some(json!({ "product_id": product_id, "quantity": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, low) = send(&app, "GET", "/api/v1/products/low-stock", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low.as_array().map(Vec::len), Some(1));

    let (status, summary) = send(
        &app,
        "GET",
        "/api/v1/sales/summary?period=week",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_cents"], 4497);
    assert_eq!(summary["sale_count"], 1);
    assert_eq!(summary["top_products"][0]["name"], "Blue Mug");

    // The sale and the low-stock crossing both notified the team.
    let (status, notifications) = send(
        &app,
        "GET",
        "/api/v1/notifications?unread=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = notifications
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"sale_recorded"), "kinds: {kinds:?}");
    assert!(kinds.contains(&"low_stock"), "kinds: {kinds:?}");

    // Leaderboard has the owner on top.
    let (status, board) = send(&app, "GET", "/api/v1/team/leaderboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board[0]["display_name"], "Alex");
    assert_eq!(board[0]["sale_count"], 1);
}

#[tokio::test]
async fn test_webchat_roundtrip_with_bot_fallback() {
    let app = test_app().await;
    let token = register(&app).await;

    let (_, team) = send(&app, "GET", "/api/v1/team", Some(&token), None).await;
    let team_id = team["team"]["id"].as_str().expect("team id").to_string();

    // Customer posts without auth; the bot (no LLM configured) greets.
    let (status, posted) = send(
        &app,
        "POST",
        &format!("/api/v1/webchat/{team_id}/messages"),
        None,
        Some(json!({
            "session_key": "sess-42",
            "customer_name": "Sam",
            "body": "hello!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "webchat post failed: {posted}");
    let reply = &posted["bot_reply"];
    assert_eq!(reply["author"], "bot");
    assert_eq!(reply["status"], "sent");

    // Polling the session shows both sides of the exchange.
    let (status, transcript) = send(
        &app,
        "GET",
        &format!("/api/v1/webchat/{team_id}/messages?session_key=sess-42"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transcript.as_array().map(Vec::len), Some(2));

    // The inbound message shows up in the team inbox.
    let (status, conversations) = send(&app, "GET", "/api/v1/conversations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversations[0]["channel"], "web");
    assert_eq!(conversations[0]["customer_name"], "Sam");
}

#[tokio::test]
async fn test_agent_reply_on_unconfigured_channel_marks_failed() {
    let app = test_app().await;
    let token = register(&app).await;

    let (status, conversation) = send(
        &app,
        "POST",
        "/api/v1/conversations",
        Some(&token),
        Some(json!({
            "channel": "sms",
            "customer_address": "+15551234567",
            "customer_name": "Sam",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation_id = conversation["id"].as_str().expect("id").to_string();

    // No Twilio configured: the message is stored as failed, not a 5xx.
    let (status, message) = send(
        &app,
        "POST",
        &format!("/api/v1/conversations/{conversation_id}/messages"),
        Some(&token),
        Some(json!({ "body": "your order shipped!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["status"], "failed");
}

#[tokio::test]
async fn test_team_invite_requires_owner_and_appears_in_activities() {
    let app = test_app().await;
    let token = register(&app).await;

    let (status, invite) = send(
        &app,
        "POST",
        "/api/v1/team/invite",
        Some(&token),
        Some(json!({ "email": "sam@example.com", "display_name": "Sam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "invite failed: {invite}");
    let temp_password = invite["temporary_password"]
        .as_str()
        .expect("temporary password")
        .to_string();

    // Collaborator can sign in but cannot invite.
    let (status, login) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "sam@example.com", "password": temp_password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let collaborator_token = login["token"].as_str().expect("token").to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/team/invite",
        Some(&collaborator_token),
        Some(json!({ "email": "eve@example.com", "display_name": "Eve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, activities) = send(&app, "GET", "/api/v1/activities", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let verbs: Vec<&str> = activities
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|a| a["verb"].as_str())
        .collect();
    assert!(verbs.contains(&"invited"), "verbs: {verbs:?}");
    assert!(verbs.contains(&"registered"), "verbs: {verbs:?}");
}

#[tokio::test]
async fn test_forecast_endpoints_shape() {
    let app = test_app().await;
    let token = register(&app).await;

    let (status, product) = send(
        &app,
        "POST",
        "/api/v1/products",
        Some(&token),
        Some(json!({
            "name": "Beans",
            "sku": "BEANS-1",
            "price_cents": 2000,
            "quantity": 50,
            "min_threshold": 5,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().expect("id").to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/sales",
        Some(&token),
        Some(json!({ "product_id": product_id, "quantity": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, forecast) = send(
        &app,
        "GET",
        "/api/v1/forecast/sales?horizon=5",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "forecast failed: {forecast}");
    assert_eq!(forecast["forecast_cents"].as_array().map(Vec::len), Some(5));
    assert!(forecast["level_cents"].as_i64().expect("level") > 0);

    let (status, depletion) = send(&app, "GET", "/api/v1/forecast/inventory", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let entry = &depletion[0];
    assert_eq!(entry["quantity"], 40);
    // 10 units over a 28-day window -> about 0.36/day -> ~112 days.
    assert!(entry["days_to_stockout"].as_f64().expect("days") > 50.0);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/forecast/sales?horizon=99",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
