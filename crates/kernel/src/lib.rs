//! Folio blog kernel library.
//!
//! The router, storage backends, forms and services live here so the
//! `folio` binary and the integration tests share them.

pub mod cli;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod flash;
pub mod form;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with every route, compression and tracing.
///
/// The session layer is added by the caller, so tests can swap in an
/// in-memory session store.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::front::router())
        .merge(routes::post::router())
        .merge(routes::post_admin::router())
        .merge(routes::contact::router())
        .merge(routes::auth::router())
        .merge(routes::account::router())
        .merge(routes::health::router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
