//! Bastion-Builder Server
//!
//! Axum backend for the collaborative map editor: placement commands,
//! map snapshots, the live change feed over SSE, and SPA serving.

use axum::Router;
use http::{HeaderName, Method, header};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::ServerConfig, service::database::Database};

mod common;
mod config;
mod handler;
mod service;
mod util;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            return;
        }
    };

    let database = Database::new(config.action_log_limit);
    database.seed(&config.seed);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(bastion_proto::USER_HEADER),
        ]);

    // SPA fallback: unknown paths get index.html for client-side routing
    let index = config.static_dir.join("index.html");
    let static_files = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));

    let app: Router = handler::router(database)
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %config.addr, error = %err, "Failed to bind");
            return;
        }
    };

    tracing::info!("Server listening on {}", config.addr);
    tracing::info!("  - API: http://{}/api/maps/*", config.addr);
    tracing::info!(
        "  - Editor: http://{}/maps/{}",
        config.addr,
        config.seed.map_id
    );
    tracing::info!("  - SPA: {}", config.static_dir.display());

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "Server stopped");
    }
}
