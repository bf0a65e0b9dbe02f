//! Typed proxies for the customer and inventory services.
//!
//! Each proxy re-resolves its backing service through discovery before every
//! call; "no instance" fails with [`ClientError::ServiceUnavailable`] before
//! any request is sent.

pub mod customer;
pub mod inventory;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use common::{Customer, CustomerId, Product, ProductId};

use crate::error::ClientError;

pub use customer::{HttpCustomerClient, InMemoryCustomerDirectory};
pub use inventory::{HttpInventoryClient, InMemoryProductCatalog};
pub use remote::RemoteService;

/// Registry name of the customer service.
pub const CUSTOMER_SERVICE: &str = "customer-service";

/// Registry name of the inventory service.
pub const INVENTORY_SERVICE: &str = "inventory-service";

/// Read-only access to customers.
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// Fetches a customer; a remote 404 is `Ok(None)`.
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, ClientError>;
}

/// Product pricing and stock adjustment.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetches a product; a remote 404 is `Ok(None)`.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ClientError>;

    /// Sends a stock delta of `-quantity` and returns the updated product.
    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ClientError>;
}

#[async_trait]
impl<T: CustomerLookup + ?Sized> CustomerLookup for Arc<T> {
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, ClientError> {
        (**self).get_customer(id).await
    }
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ClientError> {
        (**self).get_product(id).await
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ClientError> {
        (**self).decrease_stock(id, quantity).await
    }
}
