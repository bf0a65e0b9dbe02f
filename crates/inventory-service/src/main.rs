//! Inventory service entry point.

use std::sync::Arc;

use common::ServiceConfig;
use common::runtime::{init_tracing, shutdown_signal};
use discovery::RegisteredService;
use inventory_service::store::{InMemoryProductStore, PgProductStore, ProductStore};
use inventory_service::{AppState, DEFAULT_PORT, SERVICE_NAME};

#[tokio::main]
async fn main() {
    init_tracing();
    let config = ServiceConfig::from_env(SERVICE_NAME, DEFAULT_PORT);

    let store: Arc<dyn ProductStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgProductStore::connect(url, config.remote_timeout)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, products are kept in memory");
            Arc::new(InMemoryProductStore::new())
        }
    };

    let app = inventory_service::create_app(AppState::new(store, &config.service_name));

    let addr = config.addr();
    tracing::info!(%addr, environment = %config.environment, "starting inventory service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    let registration = RegisteredService::register(&config, "/products").await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Some(registration) = registration {
        registration.deregister().await;
    }

    tracing::info!("stopped");
}
