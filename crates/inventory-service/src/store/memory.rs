use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Pagination, Product, ProductId};
use tokio::sync::RwLock;

use super::ProductStore;
use crate::error::StoreError;
use crate::model::{NewProduct, ProductUpdate};

#[derive(Debug, Default)]
struct Catalog {
    products: BTreeMap<ProductId, Product>,
    last_id: i64,
}

/// In-memory product store for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self, page: Pagination) -> Result<Vec<Product>, StoreError> {
        let catalog = self.catalog.read().await;
        Ok(page.apply(catalog.products.values()).cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.catalog.read().await.products.get(&id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut catalog = self.catalog.write().await;
        catalog.last_id += 1;
        let product = Product {
            id: ProductId::new(catalog.last_id),
            name: product.name,
            price: product.price,
            quantity: product.quantity,
        };
        catalog.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, StoreError> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(quantity) = update.quantity {
            product.quantity = quantity;
        }
        Ok(Some(product.clone()))
    }

    async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i64,
    ) -> Result<Option<Product>, StoreError> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.products.get_mut(&id) else {
            return Ok(None);
        };

        let quantity = product
            .quantity
            .checked_add(delta)
            .filter(|q| *q >= 0)
            .ok_or(StoreError::InsufficientStock(id))?;
        product.quantity = quantity;
        Ok(Some(product.clone()))
    }
}
