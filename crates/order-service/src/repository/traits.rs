//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试。
//! PostgreSQL 与内存两种后端都实现这些 trait，由配置选择。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Category, Customer, CustomerId, CustomerUpdate, Order, OrderId, OrderStatus, Phone, Product,
    ProductId, ProductPatch, User, UserId,
};

/// 商品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>>;
    async fn list(&self) -> Result<Vec<Product>>;
    async fn insert(&self, product: &Product) -> Result<()>;
    /// 部分更新，返回更新后的商品；不存在时返回 None
    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Option<Product>>;
    /// 删除商品，返回是否删除了记录
    async fn delete(&self, id: &ProductId) -> Result<bool>;
    async fn count(&self) -> Result<i64>;

    // 库存

    /// 库存增加 delta（可为负），返回是否命中商品
    async fn increment_stock(&self, id: &ProductId, delta: i32) -> Result<bool>;
    /// 原子的"库存充足才扣减"，库存不足或商品不存在时返回 false 且不做修改
    async fn decrement_stock_if_sufficient(&self, id: &ProductId, quantity: i32) -> Result<bool>;
}

/// 订单仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>>;
    /// 更新状态，返回是否命中订单
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
    /// 仅当当前状态为 `expected` 时更新，返回是否更新成功
    async fn update_status_if(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
    async fn delete(&self, id: &OrderId) -> Result<bool>;
    /// 按创建时间倒序列出，可按状态过滤
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>>;
    /// 按联系方式列出某客户的订单（创建时间倒序）
    async fn list_by_contact(&self, contact: &str) -> Result<Vec<Order>>;
}

/// 客户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepositoryTrait: Send + Sync {
    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Customer>>;
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>>;
    /// 插入新客户；手机号已存在时不插入并返回 false
    async fn insert(&self, customer: &Customer) -> Result<bool>;
    /// 按手机号原子更新，返回是否命中客户
    async fn update_by_phone(&self, phone: &Phone, update: &CustomerUpdate) -> Result<bool>;
    /// 按最近更新时间倒序列出
    async fn list(&self) -> Result<Vec<Customer>>;
    async fn count(&self) -> Result<i64>;
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn insert(&self, user: &User) -> Result<()>;
    async fn update_profile(&self, id: &UserId, name: &str, email: &str) -> Result<bool>;
    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<bool>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn admin_exists(&self) -> Result<bool>;
}

/// 分类仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>>;
    /// 表为空时写入默认分类，返回写入条数
    async fn seed_if_empty(&self, names: &[String]) -> Result<usize>;
}
