//! PostgreSQL product store tests
//!
//! Run with:
//!
//! ```bash
//! cargo test -p inventory-service --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;
use std::time::Duration;

use common::{Money, Pagination, ProductId};
use inventory_service::error::StoreError;
use inventory_service::model::{NewProduct, ProductUpdate};
use inventory_service::store::{PgProductStore, ProductStore};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/inventory/001_create_products.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PgProductStore {
    let info = get_container_info().await;
    let store = PgProductStore::connect(&info.connection_string, Duration::from_secs(5))
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products RESTART IDENTITY")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn widget(quantity: i64) -> NewProduct {
    NewProduct::new("Widget", Money::from_cents(1000), quantity)
}

#[tokio::test]
async fn create_and_get() {
    let store = get_test_store().await;

    let product = store.create(widget(5)).await.unwrap();
    assert_eq!(product.id, ProductId::new(1));
    assert_eq!(product.price, Money::from_cents(1000));

    assert_eq!(store.get(product.id).await.unwrap(), Some(product));
    assert!(store.get(ProductId::new(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn conditional_decrement() {
    let store = get_test_store().await;
    let id = store.create(widget(2)).await.unwrap().id;

    let product = store.adjust_stock(id, -2).await.unwrap().unwrap();
    assert_eq!(product.quantity, 0);

    let result = store.adjust_stock(id, -1).await;
    assert!(matches!(result, Err(StoreError::InsufficientStock(_))));
    assert_eq!(store.get(id).await.unwrap().unwrap().quantity, 0);

    assert!(store.adjust_stock(ProductId::new(99), -1).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_decrements_never_oversell() {
    let store = get_test_store().await;
    let id = store.create(widget(5)).await.unwrap().id;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.adjust_stock(id, -1).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(store.get(id).await.unwrap().unwrap().quantity, 0);
}

#[tokio::test]
async fn partial_update_and_list() {
    let store = get_test_store().await;
    for _ in 0..3 {
        store.create(widget(1)).await.unwrap();
    }

    let updated = store
        .update(
            ProductId::new(2),
            ProductUpdate {
                name: Some("Gadget".to_string()),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Gadget");
    assert_eq!(updated.price, Money::from_cents(1000));

    let page = store.list(Pagination::new(1, 1)).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Gadget");
}

#[tokio::test]
async fn oversized_page_returns_everything() {
    let store = get_test_store().await;
    store.create(widget(1)).await.unwrap();
    store.create(widget(2)).await.unwrap();

    let all = store.list(Pagination::new(0, usize::MAX)).await.unwrap();
    assert_eq!(all.len(), 2);
}
