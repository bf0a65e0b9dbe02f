use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BillId, BillItemId, CustomerId, Money, ProductId};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::{BillStore, Pagination};
use crate::bill::{Bill, BillDraft, BillItem};
use crate::error::StoreError;

/// PostgreSQL-backed bill store.
#[derive(Clone)]
pub struct PgBillStore {
    pool: PgPool,
}

impl PgBillStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool whose connection acquisition is bounded by `timeout`.
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations/billing")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_item(row: &PgRow) -> Result<BillItem, StoreError> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::InvalidRow(format!("quantity {quantity} out of range")))?;

        Ok(BillItem {
            id: BillItemId::new(row.try_get("id")?),
            bill_id: BillId::new(row.try_get("bill_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity,
            unit_price: Money::new(row.try_get::<Decimal, _>("unit_price")?),
            sub_total: Money::new(row.try_get::<Decimal, _>("sub_total")?),
        })
    }

    fn row_to_bill(row: &PgRow, items: Vec<BillItem>) -> Result<Bill, StoreError> {
        Ok(Bill {
            id: BillId::new(row.try_get("id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            bill_date: row.try_get::<DateTime<Utc>, _>("bill_date")?,
            total_amount: Money::new(row.try_get::<Decimal, _>("total_amount")?),
            items,
        })
    }

    async fn load_items(&self, bill_ids: &[i64]) -> Result<Vec<BillItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, bill_id, product_id, quantity, unit_price, sub_total
            FROM bill_items
            WHERE bill_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(bill_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl BillStore for PgBillStore {
    async fn insert(&self, draft: BillDraft) -> Result<Bill, StoreError> {
        let mut tx = self.pool.begin().await?;

        let bill_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bills (customer_id, bill_date, total_amount)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(draft.customer_id().value())
        .bind(draft.bill_date())
        .bind(draft.total_amount().amount())
        .fetch_one(&mut *tx)
        .await?;

        let mut item_ids = Vec::with_capacity(draft.items().len());
        for item in draft.items() {
            let item_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO bill_items (bill_id, product_id, quantity, unit_price, sub_total)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(bill_id)
            .bind(item.product_id().value())
            .bind(i64::from(item.quantity()))
            .bind(item.unit_price().amount())
            .bind(item.sub_total().amount())
            .fetch_one(&mut *tx)
            .await?;

            item_ids.push(BillItemId::new(item_id));
        }

        tx.commit().await?;
        tracing::debug!(bill_id, items = item_ids.len(), "bill persisted");

        // Answer with what the columns hold, not with the draft.
        let id = BillId::new(bill_id);
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::InvalidRow(format!("bill {id} missing after commit")))
    }

    async fn get(&self, id: BillId) -> Result<Option<Bill>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, bill_date, total_amount
            FROM bills
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(&[id.value()]).await?;
        Self::row_to_bill(&row, items).map(Some)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Bill>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, bill_date, total_amount
            FROM bills
            ORDER BY id ASC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(page.sql_offset())
        .bind(page.sql_limit())
        .fetch_all(&self.pool)
        .await?;

        let bill_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut items_by_bill: HashMap<i64, Vec<BillItem>> = HashMap::new();
        for item in self.load_items(&bill_ids).await? {
            items_by_bill
                .entry(item.bill_id.value())
                .or_default()
                .push(item);
        }

        rows.iter()
            .zip(bill_ids)
            .map(|(row, bill_id)| {
                let items = items_by_bill.remove(&bill_id).unwrap_or_default();
                Self::row_to_bill(row, items)
            })
            .collect()
    }
}
