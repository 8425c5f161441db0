//! Schedly API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod rate_limit_sweeper;
mod state;

use std::net::SocketAddr;

use schedly_core::AppError;
use tokio::signal;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackend};
use crate::api_services::{Stores, build_app_state, build_rate_limit_repository};
use crate::rate_limit_sweeper::RateLimitSweeper;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let rate_limits = build_rate_limit_repository(&config.rate_limit)?;

    match &config.storage {
        StorageBackend::Memory => {
            info!("using in-memory storage; data is lost on restart");
            let app_state = build_app_state(&config, Stores::in_memory(), rate_limits);
            let session_layer = api_services::build_memory_session_layer(config.cookie_secure);
            serve(&config, app_state, session_layer).await
        }
        StorageBackend::Postgres { database_url } => {
            let pool = api_services::connect_and_migrate(database_url).await?;
            info!("database migrations applied successfully");

            if config.migrate_only {
                return Ok(());
            }

            let session_layer =
                api_services::build_postgres_session_layer(pool.clone(), config.cookie_secure)
                    .await?;
            let app_state = build_app_state(&config, Stores::postgres(pool), rate_limits);
            serve(&config, app_state, session_layer).await
        }
    }
}

async fn serve<Store>(
    config: &ApiConfig,
    app_state: AppState,
    session_layer: SessionManagerLayer<Store>,
) -> Result<(), AppError>
where
    Store: SessionStore + Clone,
{
    let sweeper = RateLimitSweeper::spawn(
        app_state.rate_limit_service.clone(),
        config.rate_limit_sweep_interval,
    );
    let app = api_router::build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "schedly-api listening");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(error = %error, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
    })
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    sweeper.shutdown().await;
    served
}
