//! WhatsApp 下单确认链接
//!
//! 下单成功后生成一条预填消息的 wa.me 链接，客户点击后与店主确认付款。
//! 纯格式化逻辑，不访问任何存储。

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Order;

/// encodeURIComponent 不转义的字符
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
        )
}

/// 与浏览器 `encodeURIComponent` 行为一致的百分号编码
///
/// 按 UTF-8 字节编码，十六进制大写
pub fn encode_uri_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 3);
    for &byte in input.as_bytes() {
        if is_unreserved(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// 金额格式化为两位小数（四舍五入）
pub fn format_money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// 确认链接生成器
#[derive(Debug, Clone)]
pub struct CheckoutLinkFormatter {
    whatsapp_number: String,
    store_name: String,
}

impl CheckoutLinkFormatter {
    pub fn new(whatsapp_number: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            whatsapp_number: whatsapp_number.into(),
            store_name: store_name.into(),
        }
    }

    /// 生成发给店主的订单消息
    pub fn message(&self, order: &Order) -> String {
        let items = order
            .items
            .iter()
            .map(|item| {
                format!(
                    "• {}x {} - R$ {}",
                    item.quantity,
                    item.name,
                    format_money(item.subtotal())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let address = if order.has_address() {
            order.address.as_str()
        } else {
            "A combinar"
        };

        format!(
            "🛒 *Novo Pedido - {store}*\n\
             \n\
             📋 *Pedido #{id}*\n\
             \n\
             *Cliente:* {name}\n\
             *Telefone:* {phone}\n\
             \n\
             *Itens:*\n\
             {items}\n\
             \n\
             💰 *Total: R$ {total}*\n\
             \n\
             🏠 *Endereço de entrega:*\n\
             {address}\n\
             \n\
             Aguardo confirmação do pagamento para envio! 🚀",
            store = self.store_name,
            id = order.id,
            name = order.customer_name,
            phone = order.customer_contact,
            items = items,
            total = format_money(order.total),
            address = address,
        )
    }

    /// 生成 wa.me 链接
    pub fn link(&self, order: &Order) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.whatsapp_number,
            encode_uri_component(&self.message(order))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderId, OrderItem, OrderStatus, Phone, ProductId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order(address: &str) -> Order {
        let items = vec![
            OrderItem {
                product_id: ProductId::new("p1"),
                name: "Ignite V50".to_string(),
                flavor: "Menta".to_string(),
                price: dec!(89.9),
                quantity: 2,
            },
            OrderItem {
                product_id: ProductId::new("p2"),
                name: "Waka 6000".to_string(),
                flavor: "Uva".to_string(),
                price: dec!(75),
                quantity: 1,
            },
        ];
        Order {
            id: OrderId::new("order-1"),
            customer_name: "Ana".to_string(),
            customer_contact: Phone::new("11999990000"),
            address: address.to_string(),
            total: Order::total_of(&items),
            items,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("abc-_.!~*'()"), "abc-_.!~*'()");
        assert_eq!(encode_uri_component("a b"), "a%20b");
        assert_eq!(encode_uri_component("R$ 10\n"), "R%24%2010%0A");
        assert_eq!(encode_uri_component("#&=?/"), "%23%26%3D%3F%2F");
        assert_eq!(encode_uri_component("ç"), "%C3%A7");
        assert_eq!(encode_uri_component("🛒"), "%F0%9F%9B%92");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(10)), "10.00");
        assert_eq!(format_money(dec!(179.8)), "179.80");
        assert_eq!(format_money(dec!(0.125)), "0.13");
    }

    #[test]
    fn test_message_layout() {
        let formatter = CheckoutLinkFormatter::new("5511999999999", "Pods in Box");
        let message = formatter.message(&order("Rua A, 1"));

        let expected = "🛒 *Novo Pedido - Pods in Box*\n\
                        \n\
                        📋 *Pedido #order-1*\n\
                        \n\
                        *Cliente:* Ana\n\
                        *Telefone:* 11999990000\n\
                        \n\
                        *Itens:*\n\
                        • 2x Ignite V50 - R$ 179.80\n\
                        • 1x Waka 6000 - R$ 75.00\n\
                        \n\
                        💰 *Total: R$ 254.80*\n\
                        \n\
                        🏠 *Endereço de entrega:*\n\
                        Rua A, 1\n\
                        \n\
                        Aguardo confirmação do pagamento para envio! 🚀";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_missing_address_falls_back() {
        let formatter = CheckoutLinkFormatter::new("5511999999999", "Pods in Box");
        let message = formatter.message(&order(""));
        assert!(message.contains("🏠 *Endereço de entrega:*\nA combinar\n"));
    }

    #[test]
    fn test_link() {
        let formatter = CheckoutLinkFormatter::new("5511988887777", "Pods in Box");
        let link = formatter.link(&order(""));
        assert!(link.starts_with("https://wa.me/5511988887777?text="));
        assert!(!link.contains(' '));
        assert!(link.contains("Pedido%20%23order-1"));
    }
}
