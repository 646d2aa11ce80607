//! 标识符类型
//!
//! 所有实体之间都是软引用：订单通过 `Phone` 指向客户，订单行通过 `ProductId`
//! 指向商品。持有一个标识符并不保证目标存在，查询方需要处理"不存在"的情况，
//! 而不是把悬空引用当作错误。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 商品 ID 中携带口味后缀的分隔符
pub const FLAVOR_SUFFIX_SEPARATOR: &str = "-flavor-";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// 商品 ID（`prod-<millis>-<random>`）
    ProductId
);

string_id!(
    /// 订单 ID（`order-<millis>-<random>`）
    OrderId
);

string_id!(
    /// 客户 ID（`customer-<millis>-<random>`）
    CustomerId
);

string_id!(
    /// 用户 ID（`user-<millis>-<random>`）
    UserId
);

string_id!(
    /// 客户手机号，客户聚合的自然键
    ///
    /// 历史原因在订单 JSON 中以 `customerEmail` 字段出现
    Phone
);

impl ProductId {
    /// 解析购物车中的商品引用
    ///
    /// 前端会把口味变体编码为 `<baseId>-flavor-<token>`。
    /// 返回去掉后缀的规范商品 ID，以及后缀 token（仅用于订单行展示）。
    pub fn parse_cart_reference(raw: &str) -> (ProductId, Option<String>) {
        match raw.split_once(FLAVOR_SUFFIX_SEPARATOR) {
            Some((base, token)) => {
                let token = (!token.is_empty()).then(|| token.to_string());
                (ProductId::new(base), token)
            }
            None => (ProductId::new(raw), None),
        }
    }
}

impl Phone {
    /// 去除首尾空白，空值返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }
}
