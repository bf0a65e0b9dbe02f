//! Billing service entry point.

use std::sync::Arc;

use billing::{BillStore, InMemoryBillStore, PgBillStore};
use billing_service::config::{BillingConfig, DiscoveryMode};
use common::runtime::{init_tracing, shutdown_signal};
use discovery::{ConsulDiscovery, RegisteredService, ServiceDiscovery, StaticDiscovery};

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    init_tracing();
    let config = BillingConfig::from_env();
    let service = &config.service;

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    billing_service::routes::metrics::describe();

    // 3. Bill storage
    let store: Arc<dyn BillStore> = match service.database_url.as_deref() {
        Some(url) => {
            let store = PgBillStore::connect(url, service.remote_timeout)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL bill store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, bills are kept in memory");
            Arc::new(InMemoryBillStore::new())
        }
    };

    // 4. Collaborator discovery
    let discovery: Arc<dyn ServiceDiscovery> = match config.discovery_mode {
        DiscoveryMode::Consul => Arc::new(
            ConsulDiscovery::new(service.consul_url(), service.remote_timeout)
                .expect("failed to build Consul client"),
        ),
        DiscoveryMode::Static => Arc::new(
            StaticDiscovery::parse(&config.static_services)
                .expect("invalid STATIC_SERVICES"),
        ),
    };
    tracing::info!(mode = ?config.discovery_mode, "service discovery configured");

    // 5. Build the application
    let state = billing_service::create_remote_state(
        &service.service_name,
        discovery,
        store,
        service.remote_timeout,
    )
    .expect("failed to build remote clients");
    let app = billing_service::create_app(state, metrics_handle);

    // 6. Register and serve
    let addr = service.addr();
    tracing::info!(%addr, environment = %service.environment, "starting billing service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    let registration = RegisteredService::register(service, "/api/bills").await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Some(registration) = registration {
        registration.deregister().await;
    }

    tracing::info!("server shut down gracefully");
}
