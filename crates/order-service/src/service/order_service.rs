//! 订单服务
//!
//! 处理下单、状态流转与删除的核心业务逻辑，包括：
//! - 购物车校验（空车、联系人、商品存在性、库存充足性）
//! - 订单行快照与总价计算
//! - 库存的原子扣减 / 归还
//! - 客户聚合维护
//! - WhatsApp 确认链接生成
//!
//! ## 下单流程
//!
//! 1. 参数校验 -> 2. 解析商品引用 -> 3. 库存校验 -> 4. 生成快照与总价
//! -> 5. 扣减库存 -> 6. 写入订单 -> 7. 客户 upsert -> 8. 生成确认链接
//!
//! 1-4 只读，任何一步失败都不产生写入。5-7 是三个独立的存储调用，没有跨集合事务：
//! - 扣减使用"库存充足才扣减"的条件更新；并发请求抢先扣完时，回滚本次已扣减的部分，
//!   按库存不足返回
//! - 订单写入失败时归还本次扣减的库存
//! - 其余中途失败不自动重试，以 `reconciliation_required = true` 记录 error 日志并计数，
//!   由人工对账

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use pods_shared::observability::metrics;

use crate::error::{OrderError, Result};
use crate::models::{Order, OrderId, OrderItem, OrderStatus, Phone, ProductId};
use crate::repository::{CustomerRepositoryTrait, OrderRepositoryTrait, ProductRepositoryTrait};
use crate::service::checkout_link::CheckoutLinkFormatter;
use crate::service::customer_aggregate::CustomerAggregate;
use crate::service::dto::{CartItem, CreateOrderRequest, CreateOrderResponse};
use crate::service::id_gen::IdGenerator;
use crate::service::transition::{self, StockEffect};

/// 记录需要人工对账的中途失败
fn report_reconciliation(step: &'static str, order_id: &OrderId, items: &[OrderItem], err: &OrderError) {
    error!(
        reconciliation_required = true,
        step,
        order_id = %order_id,
        items = ?items,
        error = %err,
        "订单写入中途失败，需要人工对账"
    );
    metrics::record_reconciliation_required(step);
}

/// 订单服务
pub struct OrderService {
    products: Arc<dyn ProductRepositoryTrait>,
    orders: Arc<dyn OrderRepositoryTrait>,
    customers: CustomerAggregate,
    id_gen: Arc<dyn IdGenerator>,
    checkout: CheckoutLinkFormatter,
}

impl OrderService {
    pub fn new(
        products: Arc<dyn ProductRepositoryTrait>,
        orders: Arc<dyn OrderRepositoryTrait>,
        customers: Arc<dyn CustomerRepositoryTrait>,
        id_gen: Arc<dyn IdGenerator>,
        checkout: CheckoutLinkFormatter,
    ) -> Self {
        Self {
            products,
            orders,
            customers: CustomerAggregate::new(customers, id_gen.clone()),
            id_gen,
            checkout,
        }
    }

    // ==================== 下单 ====================

    /// 创建订单
    #[instrument(skip(self, request), fields(item_count = request.items.len(), phone = %request.customer_phone))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<CreateOrderResponse> {
        let started = Instant::now();
        let result = self.execute_create(request).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_business_error() => "rejected",
            Err(_) => "failed",
        };
        metrics::record_order_created(outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn execute_create(&self, request: CreateOrderRequest) -> Result<CreateOrderResponse> {
        // 1. 参数校验
        let (customer_name, phone) = Self::validate_request(&request)?;

        // 2-4. 只读校验，生成订单行快照
        let items = self.build_items(&request.items).await?;
        let total = Order::total_of(&items);
        let address = request
            .address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let order = Order {
            id: OrderId::new(self.id_gen.generate("order")),
            customer_name,
            customer_contact: phone,
            address,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };

        // 5. 扣减库存
        self.reserve_stock(&order.id, &order.items).await?;

        // 6. 写入订单
        if let Err(e) = self.orders.insert(&order).await {
            error!(order_id = %order.id, error = %e, "订单写入失败，归还已扣减库存");
            self.release_stock(&order.id, &order.items, "order_insert_release")
                .await;
            return Err(e);
        }

        // 7. 客户聚合
        if let Err(e) = self
            .customers
            .upsert(
                &order.customer_name,
                &order.customer_contact,
                request.address.as_deref(),
                order.total,
            )
            .await
        {
            report_reconciliation("customer_upsert", &order.id, &order.items, &e);
            return Err(e);
        }

        info!(
            order_id = %order.id,
            phone = %order.customer_contact,
            total = %order.total,
            item_count = order.items.len(),
            "订单创建成功"
        );

        // 8. 确认链接
        let whatsapp_link = self.checkout.link(&order);

        Ok(CreateOrderResponse {
            order,
            whatsapp_link,
        })
    }

    /// 校验空购物车与联系人
    fn validate_request(request: &CreateOrderRequest) -> Result<(String, Phone)> {
        if request.items.is_empty() {
            return Err(OrderError::empty_cart());
        }

        let name = request.customer_name.trim();
        let phone = Phone::parse(&request.customer_phone);
        match phone {
            Some(phone) if !name.is_empty() => Ok((name.to_string(), phone)),
            _ => Err(OrderError::missing_contact()),
        }
    }

    /// 逐项校验购物车并生成订单行快照
    ///
    /// 同一商品在购物车中出现多次时按累计数量校验库存
    async fn build_items(&self, cart: &[CartItem]) -> Result<Vec<OrderItem>> {
        let mut requested: HashMap<ProductId, i32> = HashMap::new();
        let mut items = Vec::with_capacity(cart.len());

        for cart_item in cart {
            let label = if cart_item.name.trim().is_empty() {
                cart_item.id.clone()
            } else {
                cart_item.name.clone()
            };

            if cart_item.quantity <= 0 {
                return Err(OrderError::Validation(format!(
                    "Quantidade inválida para {}",
                    label
                )));
            }

            let (product_id, flavor_token) = ProductId::parse_cart_reference(&cart_item.id);
            let product = self
                .products
                .find_by_id(&product_id)
                .await?
                .ok_or(OrderError::CartItemNotFound(label))?;

            let wanted = requested.entry(product.id.clone()).or_insert(0);
            *wanted = wanted.saturating_add(cart_item.quantity);
            if product.stock < *wanted {
                warn!(
                    product_id = %product.id,
                    requested = *wanted,
                    available = product.stock,
                    "库存不足，拒绝下单"
                );
                return Err(OrderError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                });
            }

            items.push(OrderItem {
                product_id: product.id,
                name: product.name,
                flavor: flavor_token.unwrap_or(product.flavor),
                price: product.price,
                quantity: cart_item.quantity,
            });
        }

        Ok(items)
    }

    // ==================== 库存 ====================

    /// 按订单行依次原子扣减库存
    ///
    /// 某一行扣减落空时，归还本次已扣减的行并返回库存不足
    async fn reserve_stock(&self, order_id: &OrderId, items: &[OrderItem]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            match self
                .products
                .decrement_stock_if_sufficient(&item.product_id, item.quantity)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    self.release_stock(order_id, &items[..index], "reserve_release")
                        .await;

                    let available = match self.products.find_by_id(&item.product_id).await {
                        Ok(product) => product.map(|p| p.stock).unwrap_or(0),
                        Err(_) => 0,
                    };
                    warn!(
                        order_id = %order_id,
                        product_id = %item.product_id,
                        requested = item.quantity,
                        available,
                        "扣减时库存已被并发请求占用"
                    );
                    return Err(OrderError::InsufficientStock {
                        product: item.name.clone(),
                        available,
                    });
                }
                Err(e) => {
                    error!(order_id = %order_id, product_id = %item.product_id, error = %e, "库存扣减失败");
                    self.release_stock(order_id, &items[..index], "reserve_release")
                        .await;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// 归还库存（尽力而为）
    ///
    /// 商品已删除时跳过；存储失败时记录对账日志，继续处理其余行
    async fn release_stock(&self, order_id: &OrderId, items: &[OrderItem], step: &'static str) {
        for item in items {
            match self
                .products
                .increment_stock(&item.product_id, item.quantity)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(order_id = %order_id, product_id = %item.product_id, "商品已删除，跳过库存归还");
                }
                Err(e) => {
                    report_reconciliation(step, order_id, std::slice::from_ref(item), &e);
                }
            }
        }
    }

    // ==================== 状态流转 ====================

    /// 更新订单状态
    ///
    /// 进入取消：归还库存、扣回客户聚合。
    /// 离开取消：先校验全部订单行的库存，任何不足都会中止整个流转（状态、库存、聚合均不变）。
    /// 其他流转只修改 status 与 updatedAt。
    ///
    /// 带副作用的流转以"状态仍为读取时的值"为条件写入状态，并发的同一流转只有一个能生效。
    #[instrument(skip(self), fields(order_id = %id, to = %status))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let mut order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))?;

        let from = order.status;
        let effect = transition::effect_of(from, status);
        let now = Utc::now();

        match effect {
            StockEffect::None => {
                if !self.orders.update_status(id, status, now).await? {
                    return Err(OrderError::OrderNotFound(id.to_string()));
                }
            }
            StockEffect::Restore => {
                self.claim_status(&order, status, now).await?;
                self.apply_cancellation(&order, status).await?;
            }
            StockEffect::Reapply => {
                let reservable = self.check_restoration(&order).await?;
                self.claim_status(&order, status, now).await?;
                self.apply_restoration(&order, status, &reservable).await?;
            }
        }

        order.status = status;
        order.updated_at = Some(now);

        metrics::record_status_transition(from.as_str(), status.as_str(), effect.as_str());
        info!(
            order_id = %id,
            from = %from,
            to = %status,
            effect = effect.as_str(),
            "订单状态已更新"
        );

        Ok(order)
    }

    /// 以读取时的状态为条件写入新状态
    async fn claim_status(&self, order: &Order, status: OrderStatus, now: DateTime<Utc>) -> Result<()> {
        if self
            .orders
            .update_status_if(&order.id, order.status, status, now)
            .await?
        {
            return Ok(());
        }

        match self.orders.find_by_id(&order.id).await? {
            Some(current) => {
                warn!(
                    order_id = %order.id,
                    expected = %order.status,
                    actual = %current.status,
                    "订单状态已被并发请求修改"
                );
                Err(OrderError::StatusConflict(order.id.to_string()))
            }
            None => Err(OrderError::OrderNotFound(order.id.to_string())),
        }
    }

    /// 副作用未生效时把状态改回读取时的值
    async fn revert_status(&self, order: &Order, claimed: OrderStatus) {
        let reverted = self
            .orders
            .update_status_if(&order.id, claimed, order.status, Utc::now())
            .await;
        match reverted {
            Ok(true) => {}
            Ok(false) => {
                let err = OrderError::StatusConflict(order.id.to_string());
                report_reconciliation("status_revert", &order.id, &order.items, &err);
            }
            Err(e) => report_reconciliation("status_revert", &order.id, &order.items, &e),
        }
    }

    /// 进入取消：归还库存，扣回客户聚合
    async fn apply_cancellation(&self, order: &Order, claimed: OrderStatus) -> Result<()> {
        for (index, item) in order.items.iter().enumerate() {
            match self
                .products
                .increment_stock(&item.product_id, item.quantity)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(order_id = %order.id, product_id = %item.product_id, "商品已删除，跳过库存归还");
                }
                Err(e) => {
                    if index == 0 {
                        self.revert_status(order, claimed).await;
                    } else {
                        report_reconciliation("cancel_stock_restore", &order.id, &order.items, &e);
                    }
                    return Err(e);
                }
            }
        }

        if let Err(e) = self
            .customers
            .adjust(&order.customer_contact, -1, -order.total)
            .await
        {
            report_reconciliation("cancel_customer_adjust", &order.id, &order.items, &e);
            return Err(e);
        }

        Ok(())
    }

    /// 离开取消前的只读校验，返回仍需扣减库存的订单行
    ///
    /// 已删除的商品跳过；任何一行库存不足都中止
    async fn check_restoration(&self, order: &Order) -> Result<Vec<OrderItem>> {
        let mut needed: HashMap<&ProductId, i32> = HashMap::new();
        for item in &order.items {
            let entry = needed.entry(&item.product_id).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }

        let mut checked: HashSet<&ProductId> = HashSet::new();
        let mut dangling: HashSet<&ProductId> = HashSet::new();
        for item in &order.items {
            if !checked.insert(&item.product_id) {
                continue;
            }
            match self.products.find_by_id(&item.product_id).await? {
                None => {
                    warn!(order_id = %order.id, product_id = %item.product_id, "商品已删除，跳过库存扣减");
                    dangling.insert(&item.product_id);
                }
                Some(product) => {
                    let quantity = needed.get(&item.product_id).copied().unwrap_or(item.quantity);
                    if product.stock < quantity {
                        warn!(
                            order_id = %order.id,
                            product_id = %product.id,
                            required = quantity,
                            available = product.stock,
                            "库存不足，无法恢复已取消订单"
                        );
                        return Err(OrderError::InsufficientStock {
                            product: product.name,
                            available: product.stock,
                        });
                    }
                }
            }
        }

        Ok(order
            .items
            .iter()
            .filter(|item| !dangling.contains(&item.product_id))
            .cloned()
            .collect())
    }

    /// 离开取消：扣减库存，恢复客户聚合
    ///
    /// 扣减落空（校验后被并发请求买走）时状态改回已取消
    async fn apply_restoration(
        &self,
        order: &Order,
        claimed: OrderStatus,
        reservable: &[OrderItem],
    ) -> Result<()> {
        if let Err(e) = self.reserve_stock(&order.id, reservable).await {
            self.revert_status(order, claimed).await;
            return Err(e);
        }

        if let Err(e) = self
            .customers
            .adjust(&order.customer_contact, 1, order.total)
            .await
        {
            report_reconciliation("restore_customer_adjust", &order.id, &order.items, &e);
            return Err(e);
        }

        Ok(())
    }

    // ==================== 删除与查询 ====================

    /// 删除订单记录
    ///
    /// 与取消不同，删除不触碰库存与客户聚合
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<()> {
        if !self.orders.delete(id).await? {
            return Err(OrderError::OrderNotFound(id.to_string()));
        }
        info!(order_id = %id, "订单已删除");
        Ok(())
    }

    /// 查询单个订单
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))
    }

    /// 列出订单（创建时间倒序），可按状态过滤
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.orders.list(status).await
    }

    /// 按联系方式列出订单
    pub async fn list_orders_by_contact(&self, contact: &str) -> Result<Vec<Order>> {
        self.orders.list_by_contact(contact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Product};
    use crate::repository::{
        MemoryStore, MockCustomerRepositoryTrait, MockOrderRepositoryTrait,
        MockProductRepositoryTrait,
    };
    use crate::service::id_gen::SequentialIdGenerator;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn product(id: &str, name: &str, price: Decimal, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            flavor: "Original".to_string(),
            description: String::new(),
            price,
            original_price: None,
            image: String::new(),
            category: "Ignite".to_string(),
            stock,
            is_new: false,
            is_best_seller: false,
            is_featured: false,
            flavors: vec![],
            created_at: Utc::now(),
        }
    }

    fn service(store: &MemoryStore) -> OrderService {
        OrderService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("5511999999999", "Pods in Box"),
        )
    }

    fn cart(items: &[(&str, i32)]) -> Vec<CartItem> {
        items
            .iter()
            .map(|(id, quantity)| CartItem {
                id: id.to_string(),
                name: format!("item {}", id),
                quantity: *quantity,
            })
            .collect()
    }

    fn request(items: &[(&str, i32)], phone: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            items: cart(items),
            customer_name: "Ana".to_string(),
            customer_phone: phone.to_string(),
            address: None,
        }
    }

    async fn customer(store: &MemoryStore, phone: &str) -> Option<Customer> {
        store.find_by_phone(&Phone::new(phone)).await.unwrap()
    }

    // ---------- 下单 ----------

    #[tokio::test]
    async fn test_scenario_order_deducts_stock_and_creates_customer() {
        let store = MemoryStore::new();
        store.put_product(product("P", "Pod P", dec!(10.00), 5));
        let service = service(&store);

        let response = service.create_order(request(&[("P", 3)], "555-1")).await.unwrap();

        assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
        assert_eq!(response.order.total, dec!(30.00));
        assert_eq!(response.order.status, OrderStatus::Pending);
        assert!(response.whatsapp_link.starts_with("https://wa.me/5511999999999?text="));

        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 1);
        assert_eq!(c.total_spent, dec!(30.00));
    }

    #[tokio::test]
    async fn test_scenario_insufficient_stock_changes_nothing() {
        let store = MemoryStore::new();
        store.put_product(product("P", "Pod P", dec!(10.00), 5));
        let service = service(&store);
        service.create_order(request(&[("P", 3)], "555-1")).await.unwrap();

        let err = service
            .create_order(request(&[("P", 4)], "555-1"))
            .await
            .unwrap_err();

        match err {
            OrderError::InsufficientStock { product, available } => {
                assert_eq!(product, "Pod P");
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 1);
        assert_eq!(c.total_spent, dec!(30.00));
        assert_eq!(OrderRepositoryTrait::list(&store, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_short_item_blocks_whole_cart() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 5));
        store.put_product(product("B", "Pod B", dec!(20), 1));
        let service = service(&store);

        let err = service
            .create_order(request(&[("A", 2), ("B", 2)], "555-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        assert_eq!(store.stock_of(&ProductId::new("A")), Some(5));
        assert_eq!(store.stock_of(&ProductId::new("B")), Some(1));
        assert!(OrderRepositoryTrait::list(&store, None).await.unwrap().is_empty());
        assert!(customer(&store, "555-2").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_checked_cumulatively() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 3));
        let service = service(&store);

        let err = service
            .create_order(request(&[("A", 2), ("A-flavor-uva", 2)], "555-3"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock { available: 3, .. }
        ));
        assert_eq!(store.stock_of(&ProductId::new("A")), Some(3));
    }

    #[tokio::test]
    async fn test_scenario_flavor_suffix_resolves_base_product() {
        let store = MemoryStore::new();
        store.put_product(product("prod-1", "Ignite V50", dec!(89.90), 10));
        let service = service(&store);

        let response = service
            .create_order(request(&[("prod-1-flavor-mint", 2)], "555-4"))
            .await
            .unwrap();

        let item = &response.order.items[0];
        assert_eq!(item.product_id.as_str(), "prod-1");
        assert_eq!(item.flavor, "mint");
        assert_eq!(item.name, "Ignite V50");
        assert_eq!(store.stock_of(&ProductId::new("prod-1")), Some(8));
    }

    #[tokio::test]
    async fn test_line_without_suffix_uses_product_flavor() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 3));
        let service = service(&store);

        let response = service.create_order(request(&[("A", 1)], "555-5")).await.unwrap();
        assert_eq!(response.order.items[0].flavor, "Original");
    }

    #[tokio::test]
    async fn test_total_uses_price_snapshot() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(12.50), 10));
        store.put_product(product("B", "Pod B", dec!(7.25), 10));
        let service = service(&store);

        let response = service
            .create_order(request(&[("A", 2), ("B", 3)], "555-6"))
            .await
            .unwrap();
        assert_eq!(response.order.total, dec!(46.75));

        // 之后改价不影响历史订单
        let mut repriced = ProductRepositoryTrait::find_by_id(&store, &ProductId::new("A")).await.unwrap().unwrap();
        repriced.price = dec!(99);
        store.put_product(repriced);

        let stored = service.get_order(&response.order.id).await.unwrap();
        assert_eq!(stored.total, dec!(46.75));
        assert_eq!(stored.items[0].price, dec!(12.50));
    }

    #[tokio::test]
    async fn test_aggregate_accumulates_over_orders() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 100));
        let service = service(&store);

        let mut expected = Decimal::ZERO;
        for quantity in 1..=4 {
            let response = service
                .create_order(request(&[("A", quantity)], "555-7"))
                .await
                .unwrap();
            expected += response.order.total;
        }

        let c = customer(&store, "555-7").await.unwrap();
        assert_eq!(c.order_count, 4);
        assert_eq!(c.total_spent, expected);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 3));
        let service = service(&store);

        let empty = service.create_order(request(&[], "555")).await.unwrap_err();
        assert_eq!(empty.to_string(), "Carrinho vazio");

        let no_phone = service.create_order(request(&[("A", 1)], "  ")).await.unwrap_err();
        assert_eq!(no_phone.to_string(), "Nome e telefone são obrigatórios");

        let mut no_name = request(&[("A", 1)], "555");
        no_name.customer_name = String::new();
        assert!(matches!(
            service.create_order(no_name).await.unwrap_err(),
            OrderError::Validation(_)
        ));

        let zero = service.create_order(request(&[("A", 0)], "555")).await.unwrap_err();
        assert!(matches!(zero, OrderError::Validation(_)));

        let missing = service
            .create_order(request(&[("ghost", 1)], "555"))
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), "Produto item ghost não encontrado");

        assert_eq!(store.stock_of(&ProductId::new("A")), Some(3));
        assert!(customer(&store, "555").await.is_none());
    }

    #[tokio::test]
    async fn test_lost_race_compensates_applied_decrements() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_find_by_id().returning(|id| {
            Ok(Some(product(id.as_str(), &format!("Pod {}", id), dec!(10), 5)))
        });
        products
            .expect_decrement_stock_if_sufficient()
            .returning(|id, _| Ok(id.as_str() == "A"));
        products
            .expect_increment_stock()
            .withf(|id, delta| id.as_str() == "A" && *delta == 1)
            .times(1)
            .returning(|_, _| Ok(true));

        let mut orders = MockOrderRepositoryTrait::new();
        orders.expect_insert().never();
        let mut customers = MockCustomerRepositoryTrait::new();
        customers.expect_update_by_phone().never();

        let service = OrderService::new(
            Arc::new(products),
            Arc::new(orders),
            Arc::new(customers),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("1", "Pods in Box"),
        );

        let err = service
            .create_order(request(&[("A", 1), ("B", 1)], "555"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn test_order_insert_failure_releases_stock() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 5));

        let mut orders = MockOrderRepositoryTrait::new();
        orders
            .expect_insert()
            .times(1)
            .returning(|_| Err(OrderError::Database(sqlx::Error::PoolTimedOut)));
        let mut customers = MockCustomerRepositoryTrait::new();
        customers.expect_update_by_phone().never();
        customers.expect_insert().never();

        let service = OrderService::new(
            Arc::new(store.clone()),
            Arc::new(orders),
            Arc::new(customers),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("1", "Pods in Box"),
        );

        let err = service
            .create_order(request(&[("A", 2)], "555"))
            .await
            .unwrap_err();
        assert!(!err.is_business_error());
        assert_eq!(store.stock_of(&ProductId::new("A")), Some(5));
    }

    #[tokio::test]
    async fn test_customer_failure_surfaces_persistence_error() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 5));

        let mut customers = MockCustomerRepositoryTrait::new();
        customers
            .expect_update_by_phone()
            .returning(|_, _| Err(OrderError::Database(sqlx::Error::PoolTimedOut)));

        let service = OrderService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(customers),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("1", "Pods in Box"),
        );

        let err = service
            .create_order(request(&[("A", 2)], "555"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        // 订单与库存已写入，不自动回滚，由对账处理
        assert_eq!(store.stock_of(&ProductId::new("A")), Some(3));
        assert_eq!(OrderRepositoryTrait::list(&store, None).await.unwrap().len(), 1);
    }

    // ---------- 状态流转 ----------

    async fn placed_order(store: &MemoryStore, service: &OrderService) -> OrderId {
        store.put_product(product("P", "Pod P", dec!(10.00), 5));
        service
            .create_order(request(&[("P", 3)], "555-1"))
            .await
            .unwrap()
            .order
            .id
    }

    #[tokio::test]
    async fn test_scenario_cancel_then_uncancel() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;

        let cancelled = service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.updated_at.is_some());
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(5));
        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 0);
        assert_eq!(c.total_spent, dec!(0.00));

        let restored = service
            .update_order_status(&order_id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(restored.status, OrderStatus::Processing);
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 1);
        assert_eq!(c.total_spent, dec!(30.00));
    }

    #[tokio::test]
    async fn test_uncancel_blocked_by_insufficient_stock() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;
        service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();

        // 取消期间库存被其他订单消耗
        store
            .decrement_stock_if_sufficient(&ProductId::new("P"), 4)
            .await
            .unwrap();

        let err = service
            .update_order_status(&order_id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock { available: 1, .. }
        ));

        let order = service.get_order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(1));
        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 0);
        assert_eq!(c.total_spent, dec!(0.00));
    }

    #[tokio::test]
    async fn test_uncancel_checks_every_line_before_mutating() {
        let store = MemoryStore::new();
        store.put_product(product("A", "Pod A", dec!(10), 5));
        store.put_product(product("B", "Pod B", dec!(20), 5));
        let service = service(&store);
        let order_id = service
            .create_order(request(&[("A", 2), ("B", 3)], "555-8"))
            .await
            .unwrap()
            .order
            .id;
        service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(store.stock_of(&ProductId::new("A")), Some(5));

        // 只有第二行不足，第一行也不能被扣减
        store
            .decrement_stock_if_sufficient(&ProductId::new("B"), 4)
            .await
            .unwrap();

        let err = service
            .update_order_status(&order_id, OrderStatus::Shipped)
            .await
            .unwrap_err();
        match err {
            OrderError::InsufficientStock { product, available } => {
                assert_eq!(product, "Pod B");
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(store.stock_of(&ProductId::new("A")), Some(5));
        assert_eq!(store.stock_of(&ProductId::new("B")), Some(1));
        let order = service.get_order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let c = customer(&store, "555-8").await.unwrap();
        assert_eq!(c.order_count, 0);
        assert_eq!(c.total_spent, dec!(0));
    }

    #[tokio::test]
    async fn test_concurrent_cancel_loses_claim_without_side_effects() {
        let store = MemoryStore::new();
        let seed = service(&store);
        let order_id = placed_order(&store, &seed).await;
        let pending = seed.get_order(&order_id).await.unwrap();
        let mut cancelled = pending.clone();
        cancelled.status = OrderStatus::Cancelled;

        // 读取时仍为 pending，写入前已被另一请求取消
        let mut orders = MockOrderRepositoryTrait::new();
        let mut seq = mockall::Sequence::new();
        orders
            .expect_find_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(pending.clone())));
        orders
            .expect_update_status_if()
            .withf(|_, expected, status, _| {
                *expected == OrderStatus::Pending && *status == OrderStatus::Cancelled
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(false));
        orders
            .expect_find_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(cancelled.clone())));
        let mut customers = MockCustomerRepositoryTrait::new();
        customers.expect_update_by_phone().never();

        let service = OrderService::new(
            Arc::new(store.clone()),
            Arc::new(orders),
            Arc::new(customers),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("1", "Pods in Box"),
        );

        let err = service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::StatusConflict(_)));
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
    }

    #[tokio::test]
    async fn test_uncancel_lost_stock_race_reverts_status() {
        let store = MemoryStore::new();
        let seed = service(&store);
        let order_id = placed_order(&store, &seed).await;
        seed.update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();

        // 校验时库存充足，扣减时已被并发请求买走
        let mut products = MockProductRepositoryTrait::new();
        products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id.as_str(), "Pod P", dec!(10.00), 5))));
        products
            .expect_decrement_stock_if_sufficient()
            .times(1)
            .returning(|_, _| Ok(false));
        products.expect_increment_stock().never();
        let mut customers = MockCustomerRepositoryTrait::new();
        customers.expect_update_by_phone().never();

        let service = OrderService::new(
            Arc::new(products),
            Arc::new(store.clone()),
            Arc::new(customers),
            Arc::new(SequentialIdGenerator::new()),
            CheckoutLinkFormatter::new("1", "Pods in Box"),
        );

        let err = service
            .update_order_status(&order_id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));

        let order = OrderRepositoryTrait::find_by_id(&store, &order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(customer(&store, "555-1").await.unwrap().order_count, 0);
    }

    #[tokio::test]
    async fn test_scenario_non_cancellation_transitions_have_no_side_effects() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;

        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let order = service.update_order_status(&order_id, status).await.unwrap();
            assert_eq!(order.status, status);
            assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
            let c = customer(&store, "555-1").await.unwrap();
            assert_eq!(c.order_count, 1);
            assert_eq!(c.total_spent, dec!(30.00));
        }
    }

    #[tokio::test]
    async fn test_cancel_twice_is_noop() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;

        service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(store.stock_of(&ProductId::new("P")), Some(5));
        assert_eq!(customer(&store, "555-1").await.unwrap().order_count, 0);
    }

    #[tokio::test]
    async fn test_cancel_with_deleted_product_skips_it() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;
        ProductRepositoryTrait::delete(&store, &ProductId::new("P"))
            .await
            .unwrap();

        let order = service
            .update_order_status(&order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(customer(&store, "555-1").await.unwrap().order_count, 0);

        // 恢复时同样跳过已删除商品
        let order = service
            .update_order_status(&order_id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(customer(&store, "555-1").await.unwrap().order_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = OrderId::new("order-missing");

        let err = service
            .update_order_status(&id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));

        let err = service.delete_order(&id).await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_has_no_side_effects() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;

        service.delete_order(&order_id).await.unwrap();

        assert!(service.get_order(&order_id).await.is_err());
        assert_eq!(store.stock_of(&ProductId::new("P")), Some(2));
        let c = customer(&store, "555-1").await.unwrap();
        assert_eq!(c.order_count, 1);
        assert_eq!(c.total_spent, dec!(30.00));
    }

    #[tokio::test]
    async fn test_list_orders_by_status_and_contact() {
        let store = MemoryStore::new();
        let service = service(&store);
        let order_id = placed_order(&store, &service).await;
        service
            .create_order(request(&[("P", 1)], "555-9"))
            .await
            .unwrap();
        service
            .update_order_status(&order_id, OrderStatus::Shipped)
            .await
            .unwrap();

        assert_eq!(service.list_orders(None).await.unwrap().len(), 2);
        let shipped = service.list_orders(Some(OrderStatus::Shipped)).await.unwrap();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].id, order_id);
        assert_eq!(service.list_orders_by_contact("555-9").await.unwrap().len(), 1);
    }
}
