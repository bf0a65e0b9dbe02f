use std::time::Duration;

use async_trait::async_trait;
use common::{Customer, CustomerId, Pagination};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::CustomerStore;
use crate::error::StoreError;
use crate::model::{CustomerUpdate, NewCustomer};

const UNIQUE_EMAIL: &str = "unique_customer_email";

/// PostgreSQL-backed customer store.
#[derive(Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
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
        sqlx::migrate!("../../migrations/customer")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_customer(row: PgRow) -> Result<Customer, StoreError> {
        Ok(Customer {
            id: CustomerId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }

    fn map_unique_violation(e: sqlx::Error, email: &str) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.constraint() == Some(UNIQUE_EMAIL)
        {
            return StoreError::EmailTaken(email.to_string());
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn list(&self, page: Pagination) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query("SELECT id, name, email FROM customers ORDER BY id ASC OFFSET $1 LIMIT $2")
            .bind(page.sql_offset())
            .bind(page.sql_limit())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_customer).collect()
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        sqlx::query("SELECT id, name, email FROM customers WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_customer)
            .transpose()
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &customer.email))?;

        Self::row_to_customer(row)
    }

    async fn update(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, StoreError> {
        let email = update.email.clone().unwrap_or_default();
        let row = sqlx::query(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id.value())
        .bind(update.name)
        .bind(update.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &email))?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
