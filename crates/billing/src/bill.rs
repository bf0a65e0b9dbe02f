//! The bill aggregate and its create-bill request.

use chrono::{DateTime, Utc};
use common::{BillId, BillItemId, CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One requested line: which product and how many.
///
/// Carries no price; unit prices come from the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Inbound create-bill request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBill {
    pub customer_id: CustomerId,
    pub items: Vec<BillItemRequest>,
}

impl CreateBill {
    /// Creates a request for a customer with the given lines.
    pub fn new(customer_id: CustomerId, items: Vec<BillItemRequest>) -> Self {
        Self { customer_id, items }
    }

    /// Checks the shape constraints the workflow assumes.
    pub fn validate(&self) -> Result<(), String> {
        match self.items.iter().find(|item| item.quantity == 0) {
            Some(item) => Err(format!(
                "Quantity for product {} must be a positive integer",
                item.product_id
            )),
            None => Ok(()),
        }
    }
}

/// A persisted bill line, owned by its bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillItem {
    pub id: BillItemId,
    pub bill_id: BillId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub sub_total: Money,
}

/// A persisted bill (aggregate root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub customer_id: CustomerId,
    pub bill_date: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<BillItem>,
}

impl Bill {
    /// Returns true if `total_amount` equals the sum of item sub-totals.
    pub fn is_balanced(&self) -> bool {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.sub_total))
            == Some(self.total_amount)
    }
}

/// A priced line that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
    sub_total: Money,
}

impl DraftItem {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn sub_total(&self) -> Money {
        self.sub_total
    }
}

/// The in-progress bill built by the workflow.
///
/// Items can only be added through [`BillDraft::add_item`], which computes
/// the sub-total once and folds it into the running total, so a draft is
/// always balanced. Every amount in a draft is in whole cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    customer_id: CustomerId,
    bill_date: DateTime<Utc>,
    items: Vec<DraftItem>,
    total_amount: Money,
}

impl BillDraft {
    /// Starts an empty draft dated now.
    pub fn new(customer_id: CustomerId) -> Self {
        Self::dated(customer_id, Utc::now())
    }

    /// Starts an empty draft with an explicit date.
    pub fn dated(customer_id: CustomerId, bill_date: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            bill_date,
            items: Vec::new(),
            total_amount: Money::zero(),
        }
    }

    /// Appends a priced line; `sub_total = unit_price × quantity`.
    ///
    /// The unit price is rounded to whole cents first. Returns `None`, leaving
    /// the draft unchanged, when the sub-total or the running total overflows.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Option<&DraftItem> {
        let unit_price = unit_price.round_to_cents();
        let sub_total = unit_price.checked_mul(quantity)?;
        self.total_amount = self.total_amount.checked_add(sub_total)?;
        self.items.push(DraftItem {
            product_id,
            quantity,
            unit_price,
            sub_total,
        });
        self.items.last()
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn bill_date(&self) -> DateTime<Utc> {
        self.bill_date
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Attaches storage-generated identifiers.
    ///
    /// `item_ids` must hold one id per item, in item order.
    pub fn into_bill(self, id: BillId, item_ids: &[BillItemId]) -> Result<Bill, StoreError> {
        if item_ids.len() != self.items.len() {
            return Err(StoreError::InvalidRow(format!(
                "bill {id}: {} item ids for {} items",
                item_ids.len(),
                self.items.len()
            )));
        }

        let items = self
            .items
            .into_iter()
            .zip(item_ids)
            .map(|(item, item_id)| BillItem {
                id: *item_id,
                bill_id: id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                sub_total: item.sub_total,
            })
            .collect();

        Ok(Bill {
            id,
            customer_id: self.customer_id,
            bill_date: self.bill_date,
            total_amount: self.total_amount,
            items,
        })
    }
}
