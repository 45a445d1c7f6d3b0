use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::app_state::AppState;
use crate::core::{config, db};

pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Builds the shared state, attaches request tracing and serves the app
/// until the process is stopped.
pub async fn bootstrap(service_name: &str, app: Router<AppState>) -> Result<()> {
    let config = config::load()?;
    let db_pool = db::create_pool(&config.database.url).await?;
    let http_client = reqwest::Client::new();

    let app = app
        .with_state(AppState {
            db_pool,
            http_client,
        })
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .context("Failed to bind listener")?;
    tracing::info!(
        "{service_name} listening on {}",
        listener.local_addr().context("Failed to read local addr")?
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
