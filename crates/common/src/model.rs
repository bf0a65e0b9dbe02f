//! Wire models owned by the customer and inventory services.

use serde::{Deserialize, Serialize};

use crate::{CustomerId, Money, ProductId};

/// A customer as returned by `GET /customers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

/// A product as returned by `GET /products/{id}`.
///
/// `price` and `quantity` are authoritative only when they come from the
/// inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}
