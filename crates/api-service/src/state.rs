//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use pods_orders::service::{IdGenerator, TimestampIdGenerator};
use pods_orders::{CatalogService, CheckoutLinkFormatter, DashboardService, OrderService, Repositories};
use pods_shared::config::AppConfig;

use crate::auth::{JwtConfig, JwtManager};

/// Axum 应用共享状态
///
/// 服务与仓储都是 trait 对象，存储后端由启动时的配置决定
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
    pub dashboard: Arc<DashboardService>,
    pub id_gen: Arc<dyn IdGenerator>,
    pub jwt_manager: Arc<JwtManager>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        Self::with_id_generator(repos, config, Arc::new(TimestampIdGenerator))
    }

    /// 指定标识符生成器（测试中使用可预测的序号）
    pub fn with_id_generator(
        repos: Repositories,
        config: &AppConfig,
        id_gen: Arc<dyn IdGenerator>,
    ) -> Self {
        let checkout = CheckoutLinkFormatter::new(
            config.checkout.whatsapp_number.clone(),
            config.checkout.store_name.clone(),
        );

        let orders = OrderService::new(
            repos.products.clone(),
            repos.orders.clone(),
            repos.customers.clone(),
            id_gen.clone(),
            checkout,
        );
        let catalog = CatalogService::new(
            repos.products.clone(),
            repos.categories.clone(),
            id_gen.clone(),
        );
        let dashboard = DashboardService::new(
            repos.products.clone(),
            repos.orders.clone(),
            repos.customers.clone(),
        );

        Self {
            orders: Arc::new(orders),
            catalog: Arc::new(catalog),
            dashboard: Arc::new(dashboard),
            id_gen,
            jwt_manager: Arc::new(JwtManager::new(JwtConfig::from(&config.auth))),
            repos,
        }
    }
}
