// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polyglot-Tracker API Server
//!
//! Records flashcard reviews and lesson results for language learners and
//! keeps their XP, streaks and achievements current.

use polyglot_tracker::{
    config::Config, db::FirestoreDb, services::achievements::default_catalog, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        xp_per_level = config.rules.xp_per_level,
        "Starting Polyglot-Tracker API"
    );

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Seed the achievement catalog on first start
    let existing = db.list_achievements().await?;
    if existing.is_empty() {
        db.seed_achievements(&default_catalog()).await?;
    } else {
        tracing::info!(count = existing.len(), "Achievement catalog loaded");
    }

    let state = Arc::new(AppState::new(config.clone(), db));

    // Build router
    let app = polyglot_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
