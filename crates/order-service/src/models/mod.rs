//! 订单服务领域模型
//!
//! 包含商品、订单、客户、用户等核心实体定义

pub mod customer;
pub mod enums;
pub mod ids;
pub mod order;
pub mod product;
pub mod user;

// 重新导出常用类型
pub use customer::{Customer, CustomerUpdate};
pub use enums::{OrderStatus, UserRole};
pub use ids::{CustomerId, OrderId, Phone, ProductId, UserId};
pub use order::{Order, OrderItem};
pub use product::{
    ALL_CATEGORIES, Category, DEFAULT_CATEGORIES, DEFAULT_PRODUCT_IMAGE, LOW_STOCK_THRESHOLD,
    NewProduct, Product, ProductPatch, ProductQuery, ProductSort,
};
pub use user::{User, UserProfile};
