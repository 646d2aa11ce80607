//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装存储细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行数据库操作，内存后端基于 DashMap
//! - 库存扣减与客户首单插入由存储层保证原子性
//! - 定义 trait 接口以支持 mock 测试

use std::sync::Arc;

use sqlx::PgPool;

mod customer_repo;
mod memory;
mod order_repo;
mod product_repo;
mod traits;
mod user_repo;

pub use customer_repo::CustomerRepository;
pub use memory::MemoryStore;
pub use order_repo::OrderRepository;
pub use product_repo::ProductRepository;
pub use traits::*;
pub use user_repo::{CategoryRepository, UserRepository};

/// 仓储集合
///
/// 按存储后端一次性装配所有仓储，服务层只依赖 trait 对象
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepositoryTrait>,
    pub orders: Arc<dyn OrderRepositoryTrait>,
    pub customers: Arc<dyn CustomerRepositoryTrait>,
    pub users: Arc<dyn UserRepositoryTrait>,
    pub categories: Arc<dyn CategoryRepositoryTrait>,
}

impl Repositories {
    /// PostgreSQL 后端
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(ProductRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            categories: Arc::new(CategoryRepository::new(pool)),
        }
    }

    /// 内存后端，所有仓储共享同一个 MemoryStore
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            products: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            categories: Arc::new(store),
        }
    }
}
