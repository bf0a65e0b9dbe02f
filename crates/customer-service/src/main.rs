//! Customer service entry point.

use std::sync::Arc;

use common::ServiceConfig;
use common::runtime::{init_tracing, shutdown_signal};
use customer_service::store::{CustomerStore, InMemoryCustomerStore, PgCustomerStore};
use customer_service::{AppState, DEFAULT_PORT, SERVICE_NAME};
use discovery::RegisteredService;

#[tokio::main]
async fn main() {
    init_tracing();
    let config = ServiceConfig::from_env(SERVICE_NAME, DEFAULT_PORT);

    let store: Arc<dyn CustomerStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgCustomerStore::connect(url, config.remote_timeout)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, customers are kept in memory");
            Arc::new(InMemoryCustomerStore::new())
        }
    };

    let app = customer_service::create_app(AppState::new(store, &config.service_name));

    let addr = config.addr();
    tracing::info!(%addr, environment = %config.environment, "starting customer service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    let registration = RegisteredService::register(&config, "/customers").await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Some(registration) = registration {
        registration.deregister().await;
    }

    tracing::info!("server shut down gracefully");
}
