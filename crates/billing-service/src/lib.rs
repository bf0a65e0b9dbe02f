//! HTTP billing service.
//!
//! Exposes create/get/list for bills under `/api/bills`, backed by the
//! [`billing`] orchestrator, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use billing::{
    BillStore, BillingService, CUSTOMER_SERVICE, ClientError, CustomerLookup, HttpCustomerClient,
    HttpInventoryClient, INVENTORY_SERVICE, ProductCatalog, RemoteService,
};
use discovery::ServiceDiscovery;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::bills::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::check))
        .route(
            "/api/bills",
            get(routes::bills::list).post(routes::bills::create),
        )
        .route("/api/bills/{id}", get(routes::bills::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the orchestrator to explicit collaborators.
pub fn create_state(
    service_name: impl Into<String>,
    customers: Arc<dyn CustomerLookup>,
    products: Arc<dyn ProductCatalog>,
    store: Arc<dyn BillStore>,
) -> Arc<AppState> {
    Arc::new(AppState {
        billing: BillingService::new(customers, products, store),
        service_name: service_name.into(),
    })
}

/// Wires the orchestrator to the HTTP proxies, resolving collaborators
/// through `discovery` before every call.
pub fn create_remote_state(
    service_name: impl Into<String>,
    discovery: Arc<dyn ServiceDiscovery>,
    store: Arc<dyn BillStore>,
    timeout: Duration,
) -> Result<Arc<AppState>, ClientError> {
    let customers = HttpCustomerClient::new(RemoteService::new(
        CUSTOMER_SERVICE,
        discovery.clone(),
        timeout,
    )?);
    let products = HttpInventoryClient::new(RemoteService::new(
        INVENTORY_SERVICE,
        discovery,
        timeout,
    )?);

    Ok(create_state(
        service_name,
        Arc::new(customers),
        Arc::new(products),
        store,
    ))
}
