//! Product storage.

mod memory;
mod postgres;

use async_trait::async_trait;
use common::{Pagination, Product, ProductId};

use crate::error::StoreError;
use crate::model::{NewProduct, ProductUpdate};

pub use memory::InMemoryProductStore;
pub use postgres::PgProductStore;

/// Product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self, page: Pagination) -> Result<Vec<Product>, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn create(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Applies the present fields; `Ok(None)` when the product is absent.
    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, StoreError>;

    /// Adds a signed delta to the stock level.
    ///
    /// Check and apply are atomic. A delta that would take the level below
    /// zero fails with [`StoreError::InsufficientStock`] and changes nothing;
    /// `Ok(None)` when the product is absent.
    async fn adjust_stock(&self, id: ProductId, delta: i64)
    -> Result<Option<Product>, StoreError>;
}
