//! Product lookup and stock adjustment over HTTP, plus an in-memory catalog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Product, ProductId};
use reqwest::StatusCode;
use tokio::sync::RwLock;

use super::remote::{RemoteService, error_detail};
use super::{INVENTORY_SERVICE, ProductCatalog};
use crate::error::ClientError;

/// Product access against the inventory service.
///
/// - `GET /products/{id}`
/// - `PATCH /products/{id}/stock?quantity_delta=<signed>`
#[derive(Clone)]
pub struct HttpInventoryClient {
    remote: RemoteService,
}

impl HttpInventoryClient {
    /// Creates a client for the given remote service.
    pub fn new(remote: RemoteService) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl ProductCatalog for HttpInventoryClient {
    #[tracing::instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ClientError> {
        let base_url = self.remote.base_url().await?;
        let url = format!("{base_url}/products/{id}");

        let response = self
            .remote
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "error connecting to inventory service");
                self.remote.call_error(e)
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.remote.record("not_found");
                tracing::debug!(%id, "product not found");
                Ok(None)
            }
            status if status.is_success() => {
                let product = response
                    .json::<Product>()
                    .await
                    .map_err(|e| self.remote.call_error(e))?;
                self.remote.record("ok");
                Ok(Some(product))
            }
            status => Err(self.remote.call_error(format!("{url} answered {status}"))),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ClientError> {
        let base_url = self.remote.base_url().await?;
        let url = format!("{base_url}/products/{id}/stock");
        let quantity_delta = -i64::from(quantity);

        let response = self
            .remote
            .http()
            .patch(&url)
            .query(&[("quantity_delta", quantity_delta)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, product_id = %id, "failed to update stock");
                self.remote.call_error(e)
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.remote.record("not_found");
                Err(ClientError::ProductNotFoundDuringUpdate(id))
            }
            StatusCode::BAD_REQUEST => {
                self.remote.record("rejected");
                let reason = error_detail(response).await;
                Err(ClientError::StockUpdateRejected {
                    product_id: id,
                    reason,
                })
            }
            status if status.is_success() => {
                let product = response
                    .json::<Product>()
                    .await
                    .map_err(|e| self.remote.call_error(e))?;
                self.remote.record("ok");
                tracing::debug!(product_id = %id, quantity_delta, remaining = product.quantity, "stock decreased");
                Ok(product)
            }
            status => Err(self.remote.call_error(format!("{url} answered {status}"))),
        }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    lookups: Vec<ProductId>,
    adjustments: Vec<(ProductId, i64)>,
    rejections: HashMap<ProductId, String>,
    vanish_on_update: HashSet<ProductId>,
    lookup_failure: Option<String>,
    unavailable: bool,
}

/// In-memory inventory for testing.
///
/// Records every lookup and every applied stock delta so tests can observe
/// which side effects happened before a workflow aborted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.state.write().await.products.insert(product.id, product);
    }

    /// Returns the current state of a product.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.state.read().await.products.get(&id).cloned()
    }

    /// Rejects stock updates for `id` with the given reason.
    pub async fn reject_updates(&self, id: ProductId, reason: &str) {
        self.state
            .write()
            .await
            .rejections
            .insert(id, reason.to_string());
    }

    /// Makes `id` disappear between lookup and stock update.
    pub async fn vanish_on_update(&self, id: ProductId) {
        self.state.write().await.vanish_on_update.insert(id);
    }

    /// Makes lookups fail as a 5xx from the remote service would.
    pub async fn set_lookup_failure(&self, message: Option<&str>) {
        self.state.write().await.lookup_failure = message.map(str::to_string);
    }

    /// Makes every call fail as if discovery found no instance.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns the product ids looked up, in call order.
    pub async fn lookups(&self) -> Vec<ProductId> {
        self.state.read().await.lookups.clone()
    }

    /// Returns the applied stock deltas, in call order.
    pub async fn adjustments(&self) -> Vec<(ProductId, i64)> {
        self.state.read().await.adjustments.clone()
    }

    fn unavailable() -> ClientError {
        ClientError::ServiceUnavailable(INVENTORY_SERVICE.to_string())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ClientError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(Self::unavailable());
        }

        state.lookups.push(id);

        if let Some(ref message) = state.lookup_failure {
            return Err(ClientError::ServiceCall {
                service: INVENTORY_SERVICE.to_string(),
                message: message.clone(),
            });
        }

        Ok(state.products.get(&id).cloned())
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ClientError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(Self::unavailable());
        }

        if state.vanish_on_update.contains(&id) {
            state.products.remove(&id);
        }

        if let Some(reason) = state.rejections.get(&id) {
            return Err(ClientError::StockUpdateRejected {
                product_id: id,
                reason: reason.clone(),
            });
        }

        let delta = -i64::from(quantity);
        let product = state
            .products
            .get_mut(&id)
            .ok_or(ClientError::ProductNotFoundDuringUpdate(id))?;

        if product.quantity + delta < 0 {
            return Err(ClientError::StockUpdateRejected {
                product_id: id,
                reason: "Insufficient stock".to_string(),
            });
        }

        product.quantity += delta;
        let updated = product.clone();
        state.adjustments.push((id, delta));
        Ok(updated)
    }
}
