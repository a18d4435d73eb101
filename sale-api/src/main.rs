use std::net::SocketAddr;

use sale_api::{app, AppState};
use sale_store::app_config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sale_api=debug,sale_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting sale API on port {}", config.server.port);

    let app_state = AppState::from_config(&config);
    match app_state.sale_orders.chain() {
        Ok(chain) => tracing::info!(layers = ?chain.layers(), "sale order logic chain ready"),
        // lifecycle calls retry the build
        Err(e) => tracing::error!("Failed to build sale order logic chain: {}", e),
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
