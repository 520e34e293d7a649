//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::Result;
use claiss_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.base.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let state = services::initialize_services(&config)?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
