//! 商品仓储
//!
//! 提供商品的数据访问，以及下单/取消所需的库存原子操作

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use super::traits::ProductRepositoryTrait;
use crate::error::Result;
use crate::models::{Product, ProductId, ProductPatch};

/// 商品仓储（PostgreSQL）
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, flavor, description, price, original_price, image, category,
                   stock, is_new, is_best_seller, is_featured, flavors, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, flavor, description, price, original_price, image, category,
                   stock, is_new, is_best_seller, is_featured, flavors, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, flavor, description, price, original_price, image,
                                  category, stock, is_new, is_best_seller, is_featured, flavors,
                                  created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.flavor)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.is_new)
        .bind(product.is_best_seller)
        .bind(product.is_featured)
        .bind(Json(&product.flavors))
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        // original_price 需要区分"不修改"与"清空"
        let (touch_original_price, original_price) = match patch.original_price {
            Some(value) => (true, value),
            None => (false, None),
        };

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                flavor = COALESCE($3, flavor),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                original_price = CASE WHEN $6 THEN $7 ELSE original_price END,
                image = COALESCE($8, image),
                category = COALESCE($9, category),
                stock = COALESCE($10, stock),
                is_new = COALESCE($11, is_new),
                is_best_seller = COALESCE($12, is_best_seller),
                is_featured = COALESCE($13, is_featured),
                flavors = COALESCE($14, flavors)
            WHERE id = $1
            RETURNING id, name, flavor, description, price, original_price, image, category,
                      stock, is_new, is_best_seller, is_featured, flavors, created_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.flavor)
        .bind(patch.description)
        .bind(patch.price)
        .bind(touch_original_price)
        .bind(original_price)
        .bind(patch.image)
        .bind(patch.category)
        .bind(patch.stock)
        .bind(patch.is_new)
        .bind(patch.is_best_seller)
        .bind(patch.is_featured)
        .bind(patch.flavors.map(Json))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, id: &ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn increment_stock(&self, id: &ProductId, delta: i32) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_stock_if_sufficient(&self, id: &ProductId, quantity: i32) -> Result<bool> {
        // 条件更新保证并发下不会超卖
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
