//! 内存存储
//!
//! 使用 DashMap 实现的高并发内存存储，实现与 PostgreSQL 相同的仓储接口，
//! 适用于测试和本地开发环境。
//!
//! 单条记录上的读改写通过 `get_mut` 持有分片写锁完成，
//! 因此"库存充足才扣减"在内存后端同样是原子的。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::traits::{
    CategoryRepositoryTrait, CustomerRepositoryTrait, OrderRepositoryTrait,
    ProductRepositoryTrait, UserRepositoryTrait,
};
use crate::error::Result;
use crate::models::{
    Category, Customer, CustomerId, CustomerUpdate, Order, OrderId, OrderStatus, Phone, Product,
    ProductId, ProductPatch, User, UserId, UserRole,
};

/// 内存存储
///
/// 克隆开销很小，所有克隆共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    products: Arc<DashMap<ProductId, Product>>,
    orders: Arc<DashMap<OrderId, Order>>,
    /// 以手机号为键，保证自然键唯一
    customers: Arc<DashMap<Phone, Customer>>,
    users: Arc<DashMap<UserId, User>>,
    categories: Arc<DashMap<String, Category>>,
}

impl MemoryStore {
    /// 创建新的内存存储实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入商品（测试和本地演示数据用）
    pub fn put_product(&self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// 直接写入订单
    pub fn put_order(&self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    /// 直接写入客户
    pub fn put_customer(&self, customer: Customer) {
        self.customers.insert(customer.phone.clone(), customer);
    }

    /// 读取商品库存，不存在返回 None
    pub fn stock_of(&self, id: &ProductId) -> Option<i32> {
        self.products.get(id).map(|p| p.stock)
    }

    /// 清空所有数据
    pub fn clear(&self) {
        self.products.clear();
        self.orders.clear();
        self.customers.clear();
        self.users.clear();
        self.categories.clear();
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl ProductRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.products.iter().map(|e| e.value().clone()).collect();
        products.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(products)
    }

    async fn insert(&self, product: &Product) -> Result<()> {
        self.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        Ok(self.products.get_mut(id).map(|mut entry| {
            patch.apply_to(entry.value_mut());
            entry.clone()
        }))
    }

    async fn delete(&self, id: &ProductId) -> Result<bool> {
        Ok(self.products.remove(id).is_some())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.products.len() as i64)
    }

    async fn increment_stock(&self, id: &ProductId, delta: i32) -> Result<bool> {
        Ok(self
            .products
            .get_mut(id)
            .map(|mut entry| entry.stock += delta)
            .is_some())
    }

    async fn decrement_stock_if_sufficient(&self, id: &ProductId, quantity: i32) -> Result<bool> {
        let Some(mut entry) = self.products.get_mut(id) else {
            return Ok(false);
        };
        if entry.stock < quantity {
            return Ok(false);
        }
        entry.stock -= quantity;
        Ok(true)
    }
}

#[async_trait]
impl OrderRepositoryTrait for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(id).map(|o| o.clone()))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self
            .orders
            .get_mut(id)
            .map(|mut entry| {
                entry.status = status;
                entry.updated_at = Some(updated_at);
            })
            .is_some())
    }

    async fn update_status_if(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        // get_mut 持有分片写锁，比较与写入不会被其他请求穿插
        Ok(self
            .orders
            .get_mut(id)
            .filter(|entry| entry.status == expected)
            .map(|mut entry| {
                entry.status = status;
                entry.updated_at = Some(updated_at);
            })
            .is_some())
    }

    async fn delete(&self, id: &OrderId) -> Result<bool> {
        Ok(self.orders.remove(id).is_some())
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .map(|e| e.value().clone())
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_by_contact(&self, contact: &str) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|e| e.customer_contact.as_str() == contact)
            .map(|e| e.value().clone())
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }
}

#[async_trait]
impl CustomerRepositoryTrait for MemoryStore {
    async fn find_by_phone(&self, phone: &Phone) -> Result<Option<Customer>> {
        Ok(self.customers.get(phone).map(|c| c.clone()))
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>> {
        Ok(self
            .customers
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.value().clone()))
    }

    async fn insert(&self, customer: &Customer) -> Result<bool> {
        match self.customers.entry(customer.phone.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(customer.clone());
                Ok(true)
            }
        }
    }

    async fn update_by_phone(&self, phone: &Phone, update: &CustomerUpdate) -> Result<bool> {
        Ok(self
            .customers
            .get_mut(phone)
            .map(|mut entry| update.apply_to(entry.value_mut()))
            .is_some())
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> =
            self.customers.iter().map(|e| e.value().clone()).collect();
        customers.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(customers)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.customers.len() as i64)
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|e| e.email == email)
            .map(|e| e.value().clone()))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, id: &UserId, name: &str, email: &str) -> Result<bool> {
        Ok(self
            .users
            .get_mut(id)
            .map(|mut entry| {
                entry.name = name.to_string();
                entry.email = email.to_string();
            })
            .is_some())
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<bool> {
        Ok(self
            .users
            .get_mut(id)
            .map(|mut entry| entry.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn admin_exists(&self) -> Result<bool> {
        Ok(self.users.iter().any(|e| e.role == UserRole::Admin))
    }
}

#[async_trait]
impl CategoryRepositoryTrait for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.categories.iter().map(|e| e.value().clone()).collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn seed_if_empty(&self, names: &[String]) -> Result<usize> {
        if !self.categories.is_empty() {
            return Ok(0);
        }
        for (index, name) in names.iter().enumerate() {
            self.categories.insert(
                name.clone(),
                Category {
                    name: name.clone(),
                    sort_order: index as i32,
                },
            );
        }
        Ok(names.len())
    }
}
