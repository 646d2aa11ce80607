//! 客户聚合维护
//!
//! 以手机号为键维护 orderCount 与 totalSpent 两个冗余字段。

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::{OrderError, Result};
use crate::models::{Customer, CustomerId, CustomerUpdate, Phone};
use crate::repository::CustomerRepositoryTrait;
use crate::service::id_gen::IdGenerator;

/// upsert 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// 客户聚合服务
pub struct CustomerAggregate {
    customers: Arc<dyn CustomerRepositoryTrait>,
    id_gen: Arc<dyn IdGenerator>,
}

impl CustomerAggregate {
    pub fn new(customers: Arc<dyn CustomerRepositoryTrait>, id_gen: Arc<dyn IdGenerator>) -> Self {
        Self { customers, id_gen }
    }

    /// 新订单计入客户聚合
    ///
    /// 已存在：覆盖姓名，仅在提供非空地址时覆盖地址，orderCount +1，totalSpent +order_total。
    /// 不存在：以 orderCount = 1、totalSpent = order_total 创建。
    /// 并发首单时插入可能因唯一约束落空，此时回落为更新。
    #[instrument(skip(self, name, address), fields(phone = %phone, order_total = %order_total))]
    pub async fn upsert(
        &self,
        name: &str,
        phone: &Phone,
        address: Option<&str>,
        order_total: Decimal,
    ) -> Result<UpsertOutcome> {
        let update = CustomerUpdate::new_order(name, address, order_total);

        if self.customers.update_by_phone(phone, &update).await? {
            debug!("客户已存在，累加聚合");
            return Ok(UpsertOutcome::Updated);
        }

        let now = Utc::now();
        let customer = Customer {
            id: CustomerId::new(self.id_gen.generate("customer")),
            name: name.to_string(),
            phone: phone.clone(),
            address: update.address.clone().unwrap_or_default(),
            order_count: 1,
            total_spent: order_total,
            created_at: now,
            updated_at: now,
        };

        if self.customers.insert(&customer).await? {
            debug!(customer_id = %customer.id, "新客户已创建");
            return Ok(UpsertOutcome::Created);
        }

        // 并发首单：另一个请求已插入
        if self.customers.update_by_phone(phone, &update).await? {
            return Ok(UpsertOutcome::Updated);
        }

        Err(OrderError::Internal(format!(
            "客户 upsert 失败: phone={}",
            phone
        )))
    }

    /// 取消 / 恢复订单时的增量调整
    ///
    /// 客户不存在（悬空引用）时跳过并返回 false
    #[instrument(skip(self), fields(phone = %phone))]
    pub async fn adjust(
        &self,
        phone: &Phone,
        order_count_delta: i32,
        total_spent_delta: Decimal,
    ) -> Result<bool> {
        let update = CustomerUpdate::adjustment(order_count_delta, total_spent_delta);
        let hit = self.customers.update_by_phone(phone, &update).await?;
        if !hit {
            warn!(phone = %phone, "订单关联的客户不存在，跳过聚合调整");
        }
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryStore, MockCustomerRepositoryTrait};
    use crate::service::id_gen::SequentialIdGenerator;
    use rust_decimal_macros::dec;

    fn aggregate(store: &MemoryStore) -> CustomerAggregate {
        CustomerAggregate::new(
            Arc::new(store.clone()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }

    #[tokio::test]
    async fn test_first_order_creates_customer() {
        let store = MemoryStore::new();
        let service = aggregate(&store);
        let phone = Phone::new("11999990000");

        let outcome = service
            .upsert("Ana", &phone, Some("Rua A, 1"), dec!(100))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let customer = store.find_by_phone(&phone).await.unwrap().unwrap();
        assert_eq!(customer.id.as_str(), "customer-1");
        assert_eq!(customer.order_count, 1);
        assert_eq!(customer.total_spent, dec!(100));
        assert_eq!(customer.address, "Rua A, 1");
        assert_eq!(customer.created_at, customer.updated_at);
    }

    #[tokio::test]
    async fn test_repeat_orders_accumulate() {
        let store = MemoryStore::new();
        let service = aggregate(&store);
        let phone = Phone::new("11999990000");

        service.upsert("Ana", &phone, Some("Rua A, 1"), dec!(100)).await.unwrap();
        let outcome = service.upsert("Ana Maria", &phone, None, dec!(50.5)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let customer = store.find_by_phone(&phone).await.unwrap().unwrap();
        assert_eq!(customer.name, "Ana Maria");
        assert_eq!(customer.address, "Rua A, 1");
        assert_eq!(customer.order_count, 2);
        assert_eq!(customer.total_spent, dec!(150.5));
    }

    #[tokio::test]
    async fn test_adjust_missing_customer_is_skipped() {
        let store = MemoryStore::new();
        let service = aggregate(&store);
        let hit = service
            .adjust(&Phone::new("000"), -1, dec!(-10))
            .await
            .unwrap();
        assert!(!hit);
    }

    #[tokio::test]
    async fn test_lost_insert_race_falls_back_to_update() {
        let mut repo = MockCustomerRepositoryTrait::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_update_by_phone()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(false));
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        repo.expect_update_by_phone()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));

        let service = CustomerAggregate::new(Arc::new(repo), Arc::new(SequentialIdGenerator::new()));
        let outcome = service
            .upsert("Ana", &Phone::new("111"), None, dec!(10))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
    }
}
