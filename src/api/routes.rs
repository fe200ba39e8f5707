//! API route definitions.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    activities, auth, forecast, health, messages, notifications, products, sales, team, webchat,
    webhooks,
};
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Authentication
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/me", get(auth::me))
        // Products / inventory
        .route("/api/v1/products", get(products::list))
        .route("/api/v1/products", post(products::create))
        .route("/api/v1/products/low-stock", get(products::low_stock))
        .route("/api/v1/products/:id", get(products::get))
        .route("/api/v1/products/:id", put(products::update))
        .route("/api/v1/products/:id", delete(products::delete))
        .route("/api/v1/products/:id/restock", post(products::restock))
        .route("/api/v1/products/:id/sales", get(sales::list_for_product))
        // Point of sale
        .route("/api/v1/sales", post(sales::record))
        .route("/api/v1/sales", get(sales::list))
        .route("/api/v1/sales/summary", get(sales::summary))
        // Team
        .route("/api/v1/team", get(team::get))
        .route("/api/v1/team/invite", post(team::invite))
        .route("/api/v1/team/members/:id", delete(team::remove_member))
        .route("/api/v1/team/leaderboard", get(team::leaderboard))
        // Messaging inbox
        .route("/api/v1/conversations", get(messages::list))
        .route("/api/v1/conversations", post(messages::open))
        .route(
            "/api/v1/conversations/:id/messages",
            get(messages::list_messages),
        )
        .route("/api/v1/conversations/:id/messages", post(messages::send))
        .route("/api/v1/conversations/:id/bot", post(messages::set_bot))
        // Notifications
        .route("/api/v1/notifications", get(notifications::list))
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route("/api/v1/notifications/stream", get(notifications::stream))
        // Activity feed
        .route("/api/v1/activities", get(activities::list))
        // Forecasting
        .route("/api/v1/forecast/sales", get(forecast::sales))
        .route("/api/v1/forecast/inventory", get(forecast::inventory))
        // Public ingress: provider webhooks and the web-chat widget
        .route("/api/v1/webhooks/twilio/:team_id", post(webhooks::twilio))
        .route(
            "/api/v1/webchat/:team_id/messages",
            post(webchat::post_message),
        )
        .route("/api/v1/webchat/:team_id/messages", get(webchat::poll))
        // Layers
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
