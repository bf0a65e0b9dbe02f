//! Customer registry service.
//!
//! Serves the customer records the billing service validates bills
//! against: `GET /customers/{id}` answers 404 for unknown customers.

pub mod error;
pub mod model;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use store::CustomerStore;

/// Default registry name of the customer service.
pub const SERVICE_NAME: &str = "customer-service";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8081;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub store: Arc<dyn CustomerStore>,
    pub service_name: String,
}

impl AppState {
    pub fn new(store: Arc<dyn CustomerStore>, service_name: impl Into<String>) -> Arc<Self> {
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
            "/customers",
            get(routes::customers::list).post(routes::customers::create),
        )
        .route(
            "/customers/{id}",
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::delete),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
