//! Billing orchestration.
//!
//! Creating a bill is a sequential, multi-service workflow:
//! 1. Validate the customer through the customer service
//! 2. For each line item, in order: look up the authoritative price, then
//!    decrement stock through the inventory service
//! 3. Persist the bill and all its items as one unit
//!
//! Any failure aborts the workflow immediately. Stock decrements already
//! issued for earlier items are **not** rolled back; the orchestrator logs
//! and counts them so the gap stays visible.

pub mod bill;
pub mod clients;
pub mod error;
pub mod service;
pub mod state;
pub mod store;

pub use bill::{Bill, BillDraft, BillItem, BillItemRequest, CreateBill, DraftItem};
pub use clients::{
    CUSTOMER_SERVICE, CustomerLookup, HttpCustomerClient, HttpInventoryClient,
    INVENTORY_SERVICE, InMemoryCustomerDirectory, InMemoryProductCatalog, ProductCatalog,
    RemoteService,
};
pub use error::{BillingError, ClientError, StoreError};
pub use service::BillingService;
pub use state::{AbortReason, BillingState};
pub use store::{BillStore, InMemoryBillStore, Pagination, PgBillStore};
