//! The create-bill orchestrator.

use std::time::Instant;

use common::{BillId, ProductId};

use crate::bill::{Bill, BillDraft, CreateBill};
use crate::clients::{CustomerLookup, INVENTORY_SERVICE, ProductCatalog};
use crate::error::{BillingError, ClientError, Result};
use crate::state::BillingState;
use crate::store::{BillStore, Pagination};

/// Working state of one create-bill invocation.
///
/// Local to the invocation; concurrent workflows share nothing but the
/// collaborators.
#[derive(Debug, Default)]
struct Workflow {
    state: BillingState,
    committed: Vec<(ProductId, u32)>,
}

impl Workflow {
    fn advance(&mut self, next: BillingState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "workflow transition");
        self.state = next;
    }

    fn stock_committed(&mut self, product_id: ProductId, quantity: u32) {
        self.committed.push((product_id, quantity));
    }

    fn abort(&mut self, error: &BillingError) {
        let reason = error.reason();
        self.advance(BillingState::Aborted(reason));

        metrics::counter!("bill_workflow_aborted_total", "reason" => reason.as_str())
            .increment(1);

        if !self.committed.is_empty() {
            // Stock already decremented for earlier items stays decremented.
            metrics::counter!("bill_uncompensated_stock_adjustments_total")
                .increment(self.committed.len() as u64);
            tracing::warn!(
                %reason,
                error = %error,
                uncompensated = ?self.committed,
                "bill workflow aborted after committing stock adjustments"
            );
        } else if error.is_not_found() {
            tracing::info!(%reason, error = %error, "bill workflow aborted");
        } else {
            tracing::warn!(%reason, error = %error, "bill workflow aborted");
        }
    }
}

/// Orchestrates bill creation across the customer and inventory services.
///
/// Every line item is priced and has its stock decremented before the next
/// one starts. Any failure aborts the workflow; nothing is retried and stock
/// adjustments already issued are not rolled back.
pub struct BillingService<C, P, S>
where
    C: CustomerLookup,
    P: ProductCatalog,
    S: BillStore,
{
    customers: C,
    products: P,
    store: S,
}

impl<C, P, S> BillingService<C, P, S>
where
    C: CustomerLookup,
    P: ProductCatalog,
    S: BillStore,
{
    /// Creates a new billing service.
    pub fn new(customers: C, products: P, store: S) -> Self {
        Self {
            customers,
            products,
            store,
        }
    }

    /// Returns a reference to the bill store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the create-bill workflow and returns the persisted bill.
    ///
    /// Not idempotent: submitting the same request twice decrements stock
    /// twice and creates two bills.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id, items = request.items.len()))]
    pub async fn create_bill(&self, request: CreateBill) -> Result<Bill> {
        let started = Instant::now();
        let mut workflow = Workflow::default();

        match self.run(&request, &mut workflow).await {
            Ok(bill) => {
                workflow.advance(BillingState::Done);
                metrics::counter!("bills_created_total").increment(1);
                metrics::histogram!("bill_create_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(bill_id = %bill.id, total_amount = %bill.total_amount, "bill created");
                Ok(bill)
            }
            Err(e) => {
                workflow.abort(&e);
                Err(e)
            }
        }
    }

    async fn run(&self, request: &CreateBill, workflow: &mut Workflow) -> Result<Bill> {
        let customer_id = request.customer_id;
        self.customers
            .get_customer(customer_id)
            .await?
            .ok_or(BillingError::CustomerNotFound(customer_id))?;

        let mut draft = BillDraft::new(customer_id);

        for (index, line) in request.items.iter().enumerate() {
            workflow.advance(BillingState::ProcessingItems(index));
            let product_id = line.product_id;

            let product = self
                .products
                .get_product(product_id)
                .await?
                .ok_or(BillingError::ProductNotFound(product_id))?;

            // Priced before the decrement so an unbillable line touches no stock.
            let item = draft
                .add_item(product_id, line.quantity, product.price)
                .ok_or_else(|| ClientError::ServiceCall {
                    service: INVENTORY_SERVICE.to_string(),
                    message: format!(
                        "price {} for product {product_id} overflows the bill total",
                        product.price
                    ),
                })?;

            self.products
                .decrease_stock(product_id, line.quantity)
                .await
                .map_err(|source| BillingError::StockUpdateFailed { product_id, source })?;
            workflow.stock_committed(product_id, line.quantity);

            tracing::debug!(
                %product_id,
                quantity = line.quantity,
                unit_price = %item.unit_price(),
                sub_total = %item.sub_total(),
                "line item processed"
            );
        }

        workflow.advance(BillingState::Persisting);
        Ok(self.store.insert(draft).await?)
    }

    /// Loads a bill with its items.
    #[tracing::instrument(skip(self))]
    pub async fn get_bill(&self, id: BillId) -> Result<Option<Bill>> {
        Ok(self.store.get(id).await?)
    }

    /// Lists bills in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn list_bills(&self, page: Pagination) -> Result<Vec<Bill>> {
        Ok(self.store.list(page).await?)
    }
}
