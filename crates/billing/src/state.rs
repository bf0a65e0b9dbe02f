//! Create-bill workflow state machine.

use serde::{Deserialize, Serialize};

/// Why a create-bill workflow was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    CustomerNotFound,
    ProductNotFound,
    StockUpdateFailed,
    RemoteFailure,
    PersistenceFailed,
}

impl AbortReason {
    /// Returns the reason as a snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::CustomerNotFound => "customer_not_found",
            AbortReason::ProductNotFound => "product_not_found",
            AbortReason::StockUpdateFailed => "stock_update_failed",
            AbortReason::RemoteFailure => "remote_failure",
            AbortReason::PersistenceFailed => "persistence_failed",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of one create-bill workflow.
///
/// State transitions:
/// ```text
/// ValidatingCustomer ──► ProcessingItems(0) ──► ... ──► ProcessingItems(n-1) ──► Persisting ──► Done
///         │                     │                              │                  │
///         └─────────────────────┴──────────────► Aborted ◄─────┴──────────────────┘
/// ```
/// A request without items goes straight from `ValidatingCustomer` to
/// `Persisting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BillingState {
    /// Looking up the customer.
    #[default]
    ValidatingCustomer,

    /// Pricing and decrementing stock for the line item at this index.
    ProcessingItems(usize),

    /// Writing the bill aggregate to storage.
    Persisting,

    /// The bill is persisted (terminal state).
    Done,

    /// The workflow stopped early (terminal state).
    Aborted(AbortReason),
}

impl BillingState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillingState::Done | BillingState::Aborted(_))
    }

    /// Returns true if the workflow may move from `self` to `next`.
    pub fn can_transition_to(&self, next: BillingState) -> bool {
        use BillingState::*;

        match (*self, next) {
            (ValidatingCustomer, ProcessingItems(0)) => true,
            (ValidatingCustomer, Persisting) => true,
            (ProcessingItems(i), ProcessingItems(j)) => j == i + 1,
            (ProcessingItems(_), Persisting) => true,
            (Persisting, Done) => true,
            (from, Aborted(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for BillingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingState::ValidatingCustomer => write!(f, "ValidatingCustomer"),
            BillingState::ProcessingItems(i) => write!(f, "ProcessingItems({i})"),
            BillingState::Persisting => write!(f, "Persisting"),
            BillingState::Done => write!(f, "Done"),
            BillingState::Aborted(reason) => write!(f, "Aborted({reason})"),
        }
    }
}
