//! 服务层
//!
//! 实现店铺业务逻辑，协调各仓储。
//!
//! ## 模块结构
//!
//! - `order_service`: 下单、状态流转、删除
//! - `transition`: 订单状态流转表
//! - `customer_aggregate`: 客户聚合维护
//! - `catalog_service`: 商品目录
//! - `dashboard_service`: 后台看板
//! - `checkout_link`: WhatsApp 确认链接
//! - `id_gen`: 标识符生成
//! - `dto`: 数据传输对象定义

pub mod catalog_service;
pub mod checkout_link;
pub mod customer_aggregate;
pub mod dashboard_service;
pub mod dto;
pub mod id_gen;
pub mod order_service;
pub mod transition;

pub use catalog_service::CatalogService;
pub use checkout_link::{CheckoutLinkFormatter, encode_uri_component};
pub use customer_aggregate::{CustomerAggregate, UpsertOutcome};
pub use dashboard_service::{DashboardService, DateFilter};
pub use dto::*;
pub use id_gen::{IdGenerator, SequentialIdGenerator, TimestampIdGenerator};
pub use order_service::OrderService;
pub use transition::{StockEffect, effect_of};
