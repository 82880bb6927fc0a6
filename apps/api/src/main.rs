use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use querygen_api::config::Config;
use querygen_api::generation::generator::GenerationOptions;
use querygen_api::model_client::{ChatModel, OpenAiClient};
use querygen_api::routes::build_router;
use querygen_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting QueryGen API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiClient::new(
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    info!("Model client initialized (model: {})", config.openai_model);

    let options = GenerationOptions::from_config(&config);
    info!(
        "Generation options: concurrency={}, self_check={}",
        options.concurrency, options.self_check
    );

    let state = AppState {
        model,
        options,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
