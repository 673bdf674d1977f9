//! HTTP API layer with Axum routes over the ledger engine.
//!
//! This crate provides:
//! - REST API routes for accounts, items and movements
//! - The acting-user extractor
//! - Error rendering for ledger and request failures

pub mod error;
pub mod extractors;
pub mod routes;

use axum::Router;
use stockledger_core::LedgerEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The ledger engine.
    pub engine: LedgerEngine,
}

impl AppState {
    /// Creates the state around an engine.
    #[must_use]
    pub const fn new(engine: LedgerEngine) -> Self {
        Self { engine }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
