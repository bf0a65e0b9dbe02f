//! Billing error types.

use common::{CustomerId, ProductId};
use discovery::DiscoveryError;
use thiserror::Error;

use crate::state::AbortReason;

/// Errors raised by the remote service proxies.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Discovery answered, but no healthy instance of the service exists.
    #[error("{0} is unavailable: no healthy instance registered")]
    ServiceUnavailable(String),

    /// The registry itself could not be queried.
    #[error("Service discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The product existed at lookup time but was gone at update time.
    #[error("Product {0} not found during stock update")]
    ProductNotFoundDuringUpdate(ProductId),

    /// The inventory service refused the adjustment (e.g. insufficient stock).
    #[error("Stock update failed: {reason}")]
    StockUpdateRejected { product_id: ProductId, reason: String },

    /// Transport failure or unexpected status from a remote service.
    #[error("Call to {service} failed: {message}")]
    ServiceCall { service: String, message: String },
}

/// Errors raised by bill storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to the model.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// The storage backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a billing operation fails.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The customer service has no such customer.
    #[error("Customer with ID {0} not found")]
    CustomerNotFound(CustomerId),

    /// The inventory service has no such product.
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),

    /// The stock decrement for a line item failed.
    #[error("Failed to update stock for product {product_id}: {source}")]
    StockUpdateFailed {
        product_id: ProductId,
        #[source]
        source: ClientError,
    },

    /// A customer or product lookup failed outside of "not found".
    #[error(transparent)]
    Remote(#[from] ClientError),

    /// Writing or reading the ledger failed.
    #[error("Bill storage failed: {0}")]
    Persistence(#[from] StoreError),
}

impl BillingError {
    /// Stable category used for metrics and client-facing responses.
    pub fn reason(&self) -> AbortReason {
        match self {
            BillingError::CustomerNotFound(_) => AbortReason::CustomerNotFound,
            BillingError::ProductNotFound(_) => AbortReason::ProductNotFound,
            BillingError::StockUpdateFailed { .. } => AbortReason::StockUpdateFailed,
            BillingError::Remote(_) => AbortReason::RemoteFailure,
            BillingError::Persistence(_) => AbortReason::PersistenceFailed,
        }
    }

    /// True for the routine outcomes: an unknown customer or product.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BillingError::CustomerNotFound(_) | BillingError::ProductNotFound(_)
        )
    }
}

/// Convenience type alias for billing results.
pub type Result<T> = std::result::Result<T, BillingError>;
