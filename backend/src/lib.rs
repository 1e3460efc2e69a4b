//! Procurement marketplace backend
//!
//! HTTP surface over the procurement document chain: role checks at the
//! boundary, a transactional document store, and transition events.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::config::Config;

use events::EventPublisher;
use services::Workflow;
use store::Repository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub events: EventPublisher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Repository, events: EventPublisher, config: Config) -> Self {
        Self {
            repo,
            events,
            config: Arc::new(config),
        }
    }

    pub fn workflow(&self) -> Workflow {
        Workflow::new(self.repo.clone(), self.events.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Procurement Marketplace API v1"
}
