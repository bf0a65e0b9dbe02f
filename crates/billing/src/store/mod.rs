//! Bill ledger storage.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use common::BillId;

use crate::bill::{Bill, BillDraft};
use crate::error::StoreError;

pub use common::Pagination;
pub use memory::InMemoryBillStore;
pub use postgres::PgBillStore;

/// Persistence for bills and their items.
///
/// `insert` writes the bill and every item atomically: either all rows
/// become visible or none do.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Persists a draft and returns it with generated identifiers.
    async fn insert(&self, draft: BillDraft) -> Result<Bill, StoreError>;

    /// Loads a bill with its items.
    async fn get(&self, id: BillId) -> Result<Option<Bill>, StoreError>;

    /// Lists bills ordered by id.
    async fn list(&self, page: Pagination) -> Result<Vec<Bill>, StoreError>;
}

#[async_trait]
impl<T: BillStore + ?Sized> BillStore for Arc<T> {
    async fn insert(&self, draft: BillDraft) -> Result<Bill, StoreError> {
        (**self).insert(draft).await
    }

    async fn get(&self, id: BillId) -> Result<Option<Bill>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Bill>, StoreError> {
        (**self).list(page).await
    }
}
