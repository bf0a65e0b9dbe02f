//! PostgreSQL bill store tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p billing --test postgres_integration -- --test-threads=1
//! ```

use std::str::FromStr;
use std::sync::Arc;

use billing::{BillDraft, BillStore, Pagination, PgBillStore};
use common::{BillId, CustomerId, Money, ProductId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
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
                "../../../migrations/billing/001_create_bills.sql"
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

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PgBillStore {
    let info = get_container_info().await;

    let store = PgBillStore::connect(&info.connection_string, std::time::Duration::from_secs(5))
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bill_items, bills RESTART IDENTITY")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn draft(items: &[(i64, u32, i64)]) -> BillDraft {
    let mut draft = BillDraft::new(CustomerId::new(1));
    for &(product, quantity, cents) in items {
        draft
            .add_item(ProductId::new(product), quantity, Money::from_cents(cents))
            .unwrap();
    }
    draft
}

#[tokio::test]
async fn insert_returns_generated_ids() {
    let store = get_test_store().await;

    let bill = store
        .insert(draft(&[(100, 2, 1000), (101, 3, 199)]))
        .await
        .unwrap();

    assert_eq!(bill.id, BillId::new(1));
    assert_eq!(bill.items.len(), 2);
    assert!(bill.items.iter().all(|item| item.bill_id == bill.id));
    assert_ne!(bill.items[0].id, bill.items[1].id);
    assert_eq!(bill.total_amount.to_string(), "25.97");
}

#[tokio::test]
async fn get_reads_back_exact_amounts() {
    let store = get_test_store().await;
    let inserted = store.insert(draft(&[(100, 2, 1000)])).await.unwrap();

    let loaded = store.get(inserted.id).await.unwrap().unwrap();

    assert_eq!(loaded.id, inserted.id);
    assert_eq!(loaded.customer_id, CustomerId::new(1));
    assert_eq!(loaded.total_amount.to_string(), "20.00");
    assert_eq!(loaded.items[0].unit_price.to_string(), "10.00");
    assert_eq!(loaded.items[0].quantity, 2);
    assert!(loaded.is_balanced());
}

#[tokio::test]
async fn get_missing_bill_is_none() {
    let store = get_test_store().await;
    assert!(store.get(BillId::new(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_bill_is_persisted() {
    let store = get_test_store().await;

    let bill = store.insert(draft(&[])).await.unwrap();
    let loaded = store.get(bill.id).await.unwrap().unwrap();

    assert!(loaded.items.is_empty());
    assert!(loaded.total_amount.is_zero());
}

#[tokio::test]
async fn list_pages_with_items_attached() {
    let store = get_test_store().await;
    store.insert(draft(&[(100, 1, 100)])).await.unwrap();
    store.insert(draft(&[(101, 1, 200), (102, 1, 300)])).await.unwrap();
    store.insert(draft(&[(103, 1, 400)])).await.unwrap();

    let all = store.list(Pagination::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].items.len(), 2);

    let page = store.list(Pagination::new(1, 1)).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, all[1].id);
    assert_eq!(page[0].items.len(), 2);
}

#[tokio::test]
async fn deleting_a_bill_cascades_to_items() {
    let store = get_test_store().await;
    let bill = store.insert(draft(&[(100, 1, 100)])).await.unwrap();

    sqlx::query("DELETE FROM bills WHERE id = $1")
        .bind(bill.id.value())
        .execute(store.pool())
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_items")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn sub_cent_prices_stay_balanced_after_read_back() {
    let store = get_test_store().await;
    let half_cent = Money::new(Decimal::from_str("0.005").unwrap());

    let mut draft = BillDraft::new(CustomerId::new(1));
    draft.add_item(ProductId::new(100), 1, half_cent).unwrap();
    draft.add_item(ProductId::new(101), 1, half_cent).unwrap();

    let created = store.insert(draft).await.unwrap();
    let loaded = store.get(created.id).await.unwrap().unwrap();

    assert_eq!(created, loaded);
    assert!(loaded.is_balanced());
    assert_eq!(loaded.total_amount.to_string(), "0.02");
    assert!(loaded.items.iter().all(|item| item.sub_total.to_string() == "0.01"));
}

#[tokio::test]
async fn oversized_page_returns_everything() {
    let store = get_test_store().await;
    store.insert(draft(&[(100, 1, 100)])).await.unwrap();
    store.insert(draft(&[(101, 1, 200)])).await.unwrap();

    let all = store.list(Pagination::new(0, usize::MAX)).await.unwrap();
    assert_eq!(all.len(), 2);

    let none = store.list(Pagination::new(usize::MAX, 10)).await.unwrap();
    assert!(none.is_empty());
}
