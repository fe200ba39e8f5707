use anyhow::Context;
use tracing::info;

use opsdesk::api::routes::router;
use opsdesk::api::state::AppState;
use opsdesk::core::config::AppConfig;
use opsdesk::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    opsdesk::setup_logging();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("config error: {e}"))?;

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    db::migrate(&pool).await.context("migrations failed")?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config).context("failed to build app state")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "opsdesk listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
