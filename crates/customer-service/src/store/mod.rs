//! Customer storage.

mod memory;
mod postgres;

use async_trait::async_trait;
use common::{Customer, CustomerId, Pagination};

use crate::error::StoreError;
use crate::model::{CustomerUpdate, NewCustomer};

pub use memory::InMemoryCustomerStore;
pub use postgres::PgCustomerStore;

/// Customer persistence; emails are unique across customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list(&self, page: Pagination) -> Result<Vec<Customer>, StoreError>;

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Fails with [`StoreError::EmailTaken`] when the email is in use.
    async fn create(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    /// Applies the present fields; `Ok(None)` when the customer is absent.
    async fn update(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, StoreError>;

    /// Returns false when the customer is absent.
    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError>;
}
