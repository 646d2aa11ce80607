//! 客户仓储
//!
//! phone 上有唯一约束，并发首单时只有一个插入成功，另一个回落为更新

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CustomerRepositoryTrait;
use crate::error::Result;
use crate::models::{Customer, CustomerId, CustomerUpdate, Phone};

/// 客户仓储（PostgreSQL）
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepositoryTrait for CustomerRepository {
    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, address, order_count, total_spent, created_at, updated_at
            FROM customers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, address, order_count, total_spent, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn insert(&self, customer: &Customer) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, address, order_count, total_spent,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (phone) DO NOTHING
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.order_count)
        .bind(customer.total_spent)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_by_phone(&self, phone: &Phone, update: &CustomerUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                order_count = order_count + $4,
                total_spent = total_spent + $5,
                updated_at = $6
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .bind(update.name.as_deref())
        .bind(update.address.as_deref())
        .bind(update.order_count_delta)
        .bind(update.total_spent_delta)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, address, order_count, total_spent, created_at, updated_at
            FROM customers
            ORDER BY updated_at DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
