//! Pods in Box 订单与库存服务
//!
//! 店铺后端的核心领域层：商品目录、下单、订单状态流转与客户聚合。
//!
//! ## 核心功能
//!
//! - **下单**：校验购物车与实时库存，计算总价，扣减库存，写入订单，维护客户聚合，
//!   生成 WhatsApp 确认链接
//! - **状态流转**：六个平级状态，进入或离开"已取消"时归还或重新扣减库存
//! - **客户聚合**：按手机号维护 orderCount 与 totalSpent
//! - **商品目录**：公开查询与后台维护
//! - **后台看板**：营收、状态分布、低库存与热销统计
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 仓储层（PostgreSQL 与内存两种实现）
//! - `service`: 业务服务层

pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{OrderError, Result};
pub use models::*;
pub use repository::{
    CategoryRepositoryTrait, CustomerRepositoryTrait, MemoryStore, OrderRepositoryTrait,
    ProductRepositoryTrait, Repositories, UserRepositoryTrait,
};
pub use service::{
    CatalogService, CheckoutLinkFormatter, DashboardService, DateFilter, OrderService, dto,
};
