//! Product catalog and stock service.
//!
//! Owns authoritative prices and stock levels. Billing reads prices from
//! `GET /products/{id}` and decrements stock through
//! `PATCH /products/{id}/stock?quantity_delta=-n`.

pub mod error;
pub mod model;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use tower_http::trace::TraceLayer;

use store::ProductStore;

/// Default registry name of the inventory service.
pub const SERVICE_NAME: &str = "inventory-service";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8082;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub service_name: String,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>, service_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            store,
            service_name: service_name.into(),
        })
    }
}

/// Creates the Axum application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/products/{id}",
            get(routes::products::get).patch(routes::products::update),
        )
        .route("/products/{id}/stock", patch(routes::products::adjust_stock))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
