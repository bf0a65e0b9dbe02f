//! Shared building blocks for the billing microservices.
//!
//! - Typed identifiers and the `Money` value type
//! - Wire models exchanged between services (`Customer`, `Product`)
//! - Environment-driven service configuration
//! - Tracing bootstrap and graceful-shutdown signal handling

pub mod config;
pub mod ids;
pub mod model;
pub mod money;
pub mod page;
pub mod runtime;

pub use config::ServiceConfig;
pub use ids::{BillId, BillItemId, CustomerId, ProductId};
pub use model::{Customer, Product};
pub use money::Money;
pub use page::Pagination;
