//! 订单实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::OrderStatus;
use super::ids::{OrderId, Phone, ProductId};

/// 订单行
///
/// 下单时对商品的快照，之后商品改价或被删除都不会影响历史订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub flavor: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    /// 行小计：单价 × 数量
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// 订单
///
/// `total` 在创建时计算一次，之后不再重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    /// 客户手机号，JSON 中沿用历史字段名 `customerEmail`
    #[serde(rename = "customerEmail")]
    pub customer_contact: Phone,
    /// 收货地址，未提供时为空字符串
    pub address: String,
    #[sqlx(json)]
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sqlx(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// 由订单行汇总总价
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        items.iter().map(OrderItem::subtotal).sum()
    }

    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: Decimal, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new("prod-1"),
            name: "Ignite V50".to_string(),
            flavor: "Menta".to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_total_of_items() {
        let items = vec![item(dec!(89.90), 2), item(dec!(10.05), 3)];
        assert_eq!(Order::total_of(&items), dec!(209.95));
        assert_eq!(Order::total_of(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_order_serializes_contact_as_customer_email() {
        let order = Order {
            id: OrderId::new("order-1"),
            customer_name: "Ana".to_string(),
            customer_contact: Phone::new("11999990000"),
            address: String::new(),
            items: vec![item(dec!(10), 1)],
            total: dec!(10),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["customerEmail"], "11999990000");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["productId"], "prod-1");
        assert!(json.get("updatedAt").is_none());
    }
}
