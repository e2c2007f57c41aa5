// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Vitatrack API Server
//!
//! Serves the auth & session subsystem plus the onboarding endpoints for
//! the Vitatrack health/fitness frontend.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitatrack::{
    cache::TtlCache,
    config::Config,
    db::UserStore,
    services::{AuthService, Mailer, TokenIssuer},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Vitatrack API");

    // Initialize the user store: Firestore when a project is configured,
    // in-memory otherwise (local development without GCP credentials).
    let store = match &config.gcp_project_id {
        Some(project_id) => UserStore::connect(project_id)
            .await
            .expect("Failed to connect to Firestore"),
        None => {
            tracing::warn!("GCP_PROJECT_ID not set; using in-memory user store");
            UserStore::in_memory()
        }
    };

    let cache = TtlCache::new();
    let issuer = TokenIssuer::new(&config.jwt_signing_key);
    let mailer = Mailer::from_config(&config);

    let auth = AuthService::new(store.clone(), cache.clone(), issuer.clone(), mailer);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        cache,
        issuer,
        auth,
    });

    // Build router
    let app = vitatrack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vitatrack=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
