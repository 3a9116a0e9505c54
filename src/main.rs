use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use glue_api::app::{self, AppState};
use glue_api::config::{self, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glue_api=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    info!("Starting GLUE API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        error!("JWT_SECRET is not set; refusing to start");
        anyhow::bail!("JWT_SECRET must be set outside development");
    }
    if matches!(config.environment, Environment::Development) && config.email.api_url.is_none() {
        info!("No EMAIL_API_URL configured; outgoing mail will only be logged");
    }

    let store = app::open_store(&config).await?;
    let port = config.api.port;
    let router = app::router(AppState::new(store, config));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("GLUE API listening on http://{}", bind_addr);

    axum::serve(listener, router).await?;
    Ok(())
}
