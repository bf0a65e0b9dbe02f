use std::time::Duration;

use async_trait::async_trait;
use common::{Money, Pagination, Product, ProductId};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::ProductStore;
use crate::error::StoreError;
use crate::model::{NewProduct, ProductUpdate};

/// PostgreSQL-backed product store.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
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

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations/inventory")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product, StoreError> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            quantity: row.try_get("quantity")?,
        })
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self, page: Pagination) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, price, quantity FROM products ORDER BY id ASC OFFSET $1 LIMIT $2",
        )
        .bind(page.sql_offset())
        .bind(page.sql_limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        sqlx::query("SELECT id, name, price, quantity FROM products WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_product)
            .transpose()
    }

    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, price, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, quantity
            "#,
        )
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.quantity)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                quantity = COALESCE($4, quantity)
            WHERE id = $1
            RETURNING id, name, price, quantity
            "#,
        )
        .bind(id.value())
        .bind(update.name)
        .bind(update.price.map(|p| p.amount()))
        .bind(update.quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i64,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + $2
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING id, name, price, quantity
            "#,
        )
        .bind(id.value())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_product(row).map(Some);
        }

        // No row updated: either the product is missing or the guard failed.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(StoreError::InsufficientStock(id))
        } else {
            Ok(None)
        }
    }
}
