use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{BillId, BillItemId};
use tokio::sync::RwLock;

use super::{BillStore, Pagination};
use crate::bill::{Bill, BillDraft};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Ledger {
    bills: BTreeMap<BillId, Bill>,
    last_bill_id: i64,
    last_item_id: i64,
}

/// In-memory bill store for testing and local runs.
///
/// Identifiers are assigned from 1 upwards, like a database sequence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillStore {
    ledger: Arc<RwLock<Ledger>>,
    fail_on_insert: Arc<AtomicBool>,
}

impl InMemoryBillStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent inserts fail.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored bills.
    pub async fn count(&self) -> usize {
        self.ledger.read().await.bills.len()
    }
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn insert(&self, draft: BillDraft) -> Result<Bill, StoreError> {
        if self.fail_on_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ledger rejected the write".to_string()));
        }

        let mut ledger = self.ledger.write().await;

        ledger.last_bill_id += 1;
        let bill_id = BillId::new(ledger.last_bill_id);

        let first_item = ledger.last_item_id + 1;
        ledger.last_item_id += draft.items().len() as i64;
        let item_ids: Vec<BillItemId> = (first_item..=ledger.last_item_id)
            .map(BillItemId::new)
            .collect();

        let bill = draft.into_bill(bill_id, &item_ids)?;
        ledger.bills.insert(bill_id, bill.clone());
        Ok(bill)
    }

    async fn get(&self, id: BillId) -> Result<Option<Bill>, StoreError> {
        Ok(self.ledger.read().await.bills.get(&id).cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Bill>, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(page.apply(ledger.bills.values()).cloned().collect())
    }
}
