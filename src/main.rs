use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracksift::{
    Config,
    handlers::{AppState, create_router},
    storage::LocalStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage = Arc::new(LocalStorage::new(config.data_dir.clone()));
    let state = AppState::new(storage, &config);

    let app = create_router(state);
    let app = if config.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let addr = config.bind_address();
    tracing::info!("Starting tracksift server on {}", addr);
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!(
        item_scale_threshold = config.item_scale_threshold,
        max_item_span = config.max_item_span,
        max_bins = config.max_bins,
        default_budget = config.default_budget,
        "engine settings"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
