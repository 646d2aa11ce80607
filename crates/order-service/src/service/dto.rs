//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, Product, ProductId};

// ==================== 下单 ====================

/// 购物车中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// 商品引用，可能带 `-flavor-<token>` 后缀
    pub id: String,
    /// 购物车展示名，仅用于"商品不存在"的提示
    #[serde(default)]
    pub name: String,
    pub quantity: i32,
}

/// 下单请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOrderRequest {
    pub items: Vec<CartItem>,
    pub customer_name: String,
    /// 客户手机号
    pub customer_phone: String,
    pub address: Option<String>,
}

/// 下单结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: Order,
    pub whatsapp_link: String,
}

// ==================== 后台看板 ====================

/// 各状态订单数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrdersByStatus {
    pub pending: usize,
    pub confirmed: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

/// 看板汇总
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: usize,
    /// 客户数（沿用前端字段名 totalUsers）
    pub total_users: i64,
    /// 仅统计已送达订单
    pub total_revenue: Decimal,
    pub orders_by_status: OrdersByStatus,
}

/// 热销商品
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

/// 看板数据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub low_stock_products: Vec<Product>,
    pub recent_orders: Vec<Order>,
    pub top_products: Vec<TopProduct>,
    pub date_filter: String,
}
