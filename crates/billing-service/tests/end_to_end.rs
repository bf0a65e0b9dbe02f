//! Billing against live customer and inventory services.
//!
//! Both collaborators run in-process on ephemeral ports with in-memory
//! stores; billing reaches them over HTTP through static discovery.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use billing::{CUSTOMER_SERVICE, INVENTORY_SERVICE, InMemoryBillStore};
use common::{Money, ProductId};
use customer_service::model::NewCustomer;
use customer_service::store::{CustomerStore, InMemoryCustomerStore};
use discovery::{ServiceInstance, StaticDiscovery};
use inventory_service::model::NewProduct;
use inventory_service::store::{InMemoryProductStore, ProductStore};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct Deployment {
    billing: axum::Router,
    products: InMemoryProductStore,
    bills: InMemoryBillStore,
    discovery: StaticDiscovery,
}

async fn serve(app: axum::Router) -> ServiceInstance {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ServiceInstance::new("127.0.0.1", port)
}

async fn deploy() -> Deployment {
    let customers = InMemoryCustomerStore::new();
    customers
        .create(NewCustomer::new("Ada Lovelace", "ada@example.com"))
        .await
        .unwrap();

    let products = InMemoryProductStore::new();
    products
        .create(NewProduct::new("Widget", Money::from_cents(1000), 5))
        .await
        .unwrap();
    products
        .create(NewProduct::new("Gadget", Money::from_cents(250), 1))
        .await
        .unwrap();

    let customer_app = customer_service::create_app(customer_service::AppState::new(
        Arc::new(customers),
        CUSTOMER_SERVICE,
    ));
    let inventory_app = inventory_service::create_app(inventory_service::AppState::new(
        Arc::new(products.clone()),
        INVENTORY_SERVICE,
    ));

    let discovery = StaticDiscovery::new();
    discovery
        .set_instances(CUSTOMER_SERVICE, vec![serve(customer_app).await])
        .await;
    discovery
        .set_instances(INVENTORY_SERVICE, vec![serve(inventory_app).await])
        .await;

    let bills = InMemoryBillStore::new();
    let state = billing_service::create_remote_state(
        "billing-service",
        Arc::new(discovery.clone()),
        Arc::new(bills.clone()),
        Duration::from_secs(5),
    )
    .unwrap();

    Deployment {
        billing: billing_service::create_app(state, get_metrics_handle()),
        products,
        bills,
        discovery,
    }
}

async fn post_bill(app: &axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/bills")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn stock(products: &InMemoryProductStore, id: i64) -> i64 {
    products
        .get(ProductId::new(id))
        .await
        .unwrap()
        .unwrap()
        .quantity
}

#[tokio::test]
async fn bill_is_priced_by_inventory_and_decrements_stock() {
    let d = deploy().await;

    let (status, json) = post_bill(
        &d.billing,
        json!({
            "customer_id": 1,
            "items": [
                {"product_id": 1, "quantity": 2},
                {"product_id": 2, "quantity": 1}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["total_amount"], "22.50");
    assert_eq!(json["items"][0]["unit_price"], "10.00");
    assert_eq!(json["items"][0]["sub_total"], "20.00");
    assert_eq!(json["items"][1]["sub_total"], "2.50");

    assert_eq!(stock(&d.products, 1).await, 3);
    assert_eq!(stock(&d.products, 2).await, 0);
    assert_eq!(d.bills.count().await, 1);
}

#[tokio::test]
async fn unknown_customer_touches_no_stock() {
    let d = deploy().await;

    let (status, json) = post_bill(
        &d.billing,
        json!({"customer_id": 7, "items": [{"product_id": 1, "quantity": 1}]}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "customer_not_found");
    assert_eq!(stock(&d.products, 1).await, 5);
    assert_eq!(d.bills.count().await, 0);
}

#[tokio::test]
async fn insufficient_stock_leaves_earlier_decrements_in_place() {
    let d = deploy().await;

    let (status, json) = post_bill(
        &d.billing,
        json!({
            "customer_id": 1,
            "items": [
                {"product_id": 1, "quantity": 2},
                {"product_id": 2, "quantity": 3}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "stock_update_rejected");
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));

    // No compensation: the first item's decrement stays committed.
    assert_eq!(stock(&d.products, 1).await, 3);
    assert_eq!(stock(&d.products, 2).await, 1);
    assert_eq!(d.bills.count().await, 0);
}

#[tokio::test]
async fn resubmission_creates_a_second_bill() {
    let d = deploy().await;
    let body = json!({"customer_id": 1, "items": [{"product_id": 1, "quantity": 1}]});

    let (first, a) = post_bill(&d.billing, body.clone()).await;
    let (second, b) = post_bill(&d.billing, body).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CREATED);
    assert_ne!(a["id"], b["id"]);
    assert_eq!(stock(&d.products, 1).await, 3);
}

#[tokio::test]
async fn missing_inventory_instance_is_unavailable() {
    let d = deploy().await;
    d.discovery.remove(INVENTORY_SERVICE).await;

    let (status, json) = post_bill(
        &d.billing,
        json!({"customer_id": 1, "items": [{"product_id": 1, "quantity": 1}]}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "service_unavailable");
    assert_eq!(stock(&d.products, 1).await, 5);
}
