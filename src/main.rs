//! Pitch Speed Inference API
//!
//! REST API and CLI for first-pitch release speed predictions.

use axum::{routing::get, routing::post, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitch_speed::cli::{self, Cli, Commands, PathOverrides};
use pitch_speed::config::AppConfig;
use pitch_speed::routes::{self, AppState};
use pitch_speed::{PitchSpeedService, ResourcePaths, ResourceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so predict output stays clean on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitch_speed=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Predict {
            last_name,
            first_name,
            format,
            model,
            mapping,
            history,
            limit,
        } => cli::run_predict(
            last_name,
            first_name,
            format,
            PathOverrides {
                model,
                mapping,
                history,
            },
            limit,
        ),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Model path: {}", config.resources.model_path);
    tracing::info!("Mapping path: {}", config.resources.mapping_path);
    tracing::info!("History path: {}", config.resources.history_path);

    // A server without its artifacts must not start
    let store = Arc::new(ResourceStore::new(ResourcePaths::from(&config.resources)));
    store.get()?;

    let state = Arc::new(AppState {
        service: PitchSpeedService::new(store, config.history.clone()),
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/model/info", get(routes::model_info))
        .route("/predict", post(routes::predict))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
