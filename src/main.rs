use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use planner_widget::{config::WidgetConfig, routes, state::AppState, telemetry};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = WidgetConfig::from_env().context("invalid widget configuration")?;
    let state = Arc::new(AppState::from_config(&config)?);

    // Purge idle sessions in the background.
    let sessions = state.sessions.clone();
    let purge_every = sessions.ttl().min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_every);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::info!(removed, "purged idle sessions");
            }
        }
    });

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        planner = %config.planner_url,
        policy = %config.overlap_policy,
        "chat widget running"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
