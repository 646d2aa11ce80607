//! 客户聚合实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{CustomerId, Phone};

/// 客户
///
/// 以手机号为自然键的冗余聚合，记录下单次数与累计消费。
/// 首次下单时创建，之后由下单和取消/恢复订单维护，正常流程中不会删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    /// 最近一次下单使用的名字
    pub name: String,
    pub phone: Phone,
    /// 最近一次提供的非空地址
    pub address: String,
    pub order_count: i32,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 按手机号更新客户的补丁
///
/// `name`/`address` 为覆盖写；两个 delta 为增量写，由存储层原子执行
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub order_count_delta: i32,
    pub total_spent_delta: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl CustomerUpdate {
    /// 一次新订单带来的更新
    pub fn new_order(name: &str, address: Option<&str>, order_total: Decimal) -> Self {
        Self {
            name: Some(name.to_string()),
            address: address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from),
            order_count_delta: 1,
            total_spent_delta: order_total,
            updated_at: Utc::now(),
        }
    }

    /// 纯增量调整（取消 / 恢复订单）
    pub fn adjustment(order_count_delta: i32, total_spent_delta: Decimal) -> Self {
        Self {
            name: None,
            address: None,
            order_count_delta,
            total_spent_delta,
            updated_at: Utc::now(),
        }
    }

    /// 应用到内存中的客户记录
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(address) = &self.address {
            customer.address = address.clone();
        }
        customer.order_count += self.order_count_delta;
        customer.total_spent += self.total_spent_delta;
        customer.updated_at = self.updated_at;
    }
}
