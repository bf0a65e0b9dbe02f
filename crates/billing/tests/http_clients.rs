//! HTTP proxy tests against in-process fake collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use billing::{
    CUSTOMER_SERVICE, ClientError, CustomerLookup, HttpCustomerClient, HttpInventoryClient,
    INVENTORY_SERVICE, ProductCatalog, RemoteService,
};
use common::{CustomerId, ProductId};
use discovery::{ServiceDiscovery, ServiceInstance, StaticDiscovery};
use serde_json::json;

/// Ids the fake answers only after this long.
const SLOW_ID: i64 = 408;
const SLOW_RESPONSE: Duration = Duration::from_secs(10);
const CALL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Default)]
struct FakeCollaborators {
    hits: Arc<Mutex<Vec<String>>>,
    deltas: Arc<Mutex<Vec<i64>>>,
}

impl FakeCollaborators {
    fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    fn deltas(&self) -> Vec<i64> {
        self.deltas.lock().unwrap().clone()
    }
}

#[derive(serde::Deserialize)]
struct StockQuery {
    quantity_delta: i64,
}

async fn get_customer(
    State(fake): State<FakeCollaborators>,
    Path(id): Path<i64>,
) -> Response {
    fake.hits.lock().unwrap().push(format!("GET /customers/{id}"));
    if id == SLOW_ID {
        tokio::time::sleep(SLOW_RESPONSE).await;
    }
    match id {
        1 => Json(json!({"id": 1, "name": "Ada Lovelace", "email": "ada@example.com"}))
            .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Customer not found"})),
        )
            .into_response(),
    }
}

async fn get_product(State(fake): State<FakeCollaborators>, Path(id): Path<i64>) -> Response {
    fake.hits.lock().unwrap().push(format!("GET /products/{id}"));
    match id {
        100 => Json(json!({"id": 100, "name": "Widget", "price": "10.00", "quantity": 5}))
            .into_response(),
        500 => StatusCode::BAD_GATEWAY.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Product not found"})),
        )
            .into_response(),
    }
}

async fn update_stock(
    State(fake): State<FakeCollaborators>,
    Path(id): Path<i64>,
    Query(query): Query<StockQuery>,
) -> Response {
    fake.hits
        .lock()
        .unwrap()
        .push(format!("PATCH /products/{id}/stock"));
    fake.deltas.lock().unwrap().push(query.quantity_delta);
    if id == SLOW_ID {
        tokio::time::sleep(SLOW_RESPONSE).await;
    }

    match id {
        100 if 5 + query.quantity_delta >= 0 => Json(json!({
            "id": 100,
            "name": "Widget",
            "price": 10.0,
            "quantity": 5 + query.quantity_delta
        }))
        .into_response(),
        100 => (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Insufficient stock"})),
        )
            .into_response(),
        101 => (StatusCode::BAD_REQUEST, "not json").into_response(),
        500 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Product not found"})),
        )
            .into_response(),
    }
}

async fn spawn_fake() -> (ServiceInstance, FakeCollaborators) {
    let fake = FakeCollaborators::default();
    let app = Router::new()
        .route("/customers/{id}", get(get_customer))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/stock", patch(update_stock))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (ServiceInstance::new("127.0.0.1", port), fake)
}

struct Clients {
    discovery: Arc<StaticDiscovery>,
    customers: HttpCustomerClient,
    inventory: HttpInventoryClient,
    fake: FakeCollaborators,
}

async fn setup() -> Clients {
    let (instance, fake) = spawn_fake().await;

    let discovery = Arc::new(StaticDiscovery::new());
    discovery
        .set_instances(CUSTOMER_SERVICE, vec![instance.clone()])
        .await;
    discovery
        .set_instances(INVENTORY_SERVICE, vec![instance])
        .await;

    let shared: Arc<dyn ServiceDiscovery> = discovery.clone();
    let customers = HttpCustomerClient::new(
        RemoteService::new(CUSTOMER_SERVICE, shared.clone(), CALL_TIMEOUT).unwrap(),
    );
    let inventory = HttpInventoryClient::new(
        RemoteService::new(INVENTORY_SERVICE, shared, CALL_TIMEOUT).unwrap(),
    );

    Clients {
        discovery,
        customers,
        inventory,
        fake,
    }
}

#[tokio::test]
async fn test_customer_found() {
    let c = setup().await;

    let customer = c
        .customers
        .get_customer(CustomerId::new(1))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(customer.id, CustomerId::new(1));
    assert_eq!(customer.email, "ada@example.com");
}

#[tokio::test]
async fn test_customer_404_is_none() {
    let c = setup().await;

    let customer = c.customers.get_customer(CustomerId::new(99)).await.unwrap();
    assert!(customer.is_none());
}

#[tokio::test]
async fn test_customer_5xx_is_service_call_error() {
    let c = setup().await;

    let result = c.customers.get_customer(CustomerId::new(500)).await;
    match result {
        Err(ClientError::ServiceCall { service, .. }) => assert_eq!(service, CUSTOMER_SERVICE),
        other => panic!("expected ServiceCall, got {other:?}"),
    }
}

#[tokio::test]
async fn test_product_lookup() {
    let c = setup().await;

    let product = c
        .inventory
        .get_product(ProductId::new(100))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.price.to_string(), "10.00");
    assert_eq!(product.quantity, 5);

    assert!(
        c.inventory
            .get_product(ProductId::new(7))
            .await
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        c.inventory.get_product(ProductId::new(500)).await,
        Err(ClientError::ServiceCall { .. })
    ));
}

#[tokio::test]
async fn test_decrease_stock_sends_negated_quantity() {
    let c = setup().await;

    let product = c
        .inventory
        .decrease_stock(ProductId::new(100), 2)
        .await
        .unwrap();

    assert_eq!(product.quantity, 3);
    assert_eq!(product.price.to_string(), "10.00");
    assert_eq!(c.fake.deltas(), vec![-2]);
}

#[tokio::test]
async fn test_decrease_stock_rejection_carries_detail() {
    let c = setup().await;

    let result = c.inventory.decrease_stock(ProductId::new(100), 6).await;
    match result {
        Err(ClientError::StockUpdateRejected { product_id, reason }) => {
            assert_eq!(product_id, ProductId::new(100));
            assert_eq!(reason, "Insufficient stock");
        }
        other => panic!("expected StockUpdateRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_decrease_stock_rejection_without_detail() {
    let c = setup().await;

    let result = c.inventory.decrease_stock(ProductId::new(101), 1).await;
    assert!(matches!(
        result,
        Err(ClientError::StockUpdateRejected { ref reason, .. }) if reason == "Unknown error"
    ));
}

#[tokio::test]
async fn test_decrease_stock_404_is_not_found_during_update() {
    let c = setup().await;

    let result = c.inventory.decrease_stock(ProductId::new(42), 1).await;
    assert!(matches!(
        result,
        Err(ClientError::ProductNotFoundDuringUpdate(id)) if id == ProductId::new(42)
    ));
}

#[tokio::test]
async fn test_decrease_stock_5xx_is_service_call_error() {
    let c = setup().await;

    let result = c.inventory.decrease_stock(ProductId::new(500), 1).await;
    assert!(matches!(result, Err(ClientError::ServiceCall { .. })));
}

#[tokio::test]
async fn test_zero_instances_fails_before_any_request() {
    let c = setup().await;
    c.discovery.set_instances(INVENTORY_SERVICE, vec![]).await;

    let lookup = c.inventory.get_product(ProductId::new(100)).await;
    let update = c.inventory.decrease_stock(ProductId::new(100), 1).await;

    assert!(matches!(lookup, Err(ClientError::ServiceUnavailable(ref name)) if name == INVENTORY_SERVICE));
    assert!(matches!(update, Err(ClientError::ServiceUnavailable(_))));
    assert!(c.fake.hits().is_empty());
}

#[tokio::test]
async fn test_unreachable_registry_is_discovery_error() {
    let c = setup().await;
    c.discovery.set_unreachable(true);

    let result = c.customers.get_customer(CustomerId::new(1)).await;
    assert!(matches!(result, Err(ClientError::Discovery(_))));
    assert!(c.fake.hits().is_empty());
}

#[tokio::test]
async fn test_every_call_resolves_again() {
    let c = setup().await;

    c.customers.get_customer(CustomerId::new(1)).await.unwrap();
    c.inventory.get_product(ProductId::new(100)).await.unwrap();
    c.inventory
        .decrease_stock(ProductId::new(100), 1)
        .await
        .unwrap();

    assert_eq!(c.discovery.resolution_count(), 3);
}

#[tokio::test]
async fn test_slow_customer_lookup_times_out() {
    let c = setup().await;
    let started = std::time::Instant::now();

    let result = tokio::time::timeout(
        CALL_TIMEOUT * 2,
        c.customers.get_customer(CustomerId::new(SLOW_ID)),
    )
    .await
    .expect("lookup was not bounded by the client timeout");

    assert!(matches!(
        result,
        Err(ClientError::ServiceCall { ref service, .. }) if service == CUSTOMER_SERVICE
    ));
    assert!(started.elapsed() < SLOW_RESPONSE);
}

#[tokio::test]
async fn test_slow_stock_update_times_out() {
    let c = setup().await;

    let result = tokio::time::timeout(
        CALL_TIMEOUT * 2,
        c.inventory.decrease_stock(ProductId::new(SLOW_ID), 1),
    )
    .await
    .expect("stock update was not bounded by the client timeout");

    assert!(matches!(
        result,
        Err(ClientError::ServiceCall { ref service, .. }) if service == INVENTORY_SERVICE
    ));
    // The request reached the collaborator; a timeout does not retract it.
    assert_eq!(c.fake.deltas(), vec![-1]);
}
