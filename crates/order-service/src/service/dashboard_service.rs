//! 后台看板服务
//!
//! 汇总订单、商品、客户数据，供后台首页展示

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::error::Result;
use crate::models::{LOW_STOCK_THRESHOLD, Order, OrderStatus, ProductId};
use crate::repository::{CustomerRepositoryTrait, OrderRepositoryTrait, ProductRepositoryTrait};
use crate::service::dto::{Dashboard, DashboardStats, OrdersByStatus, TopProduct};

/// 最近订单条数
const RECENT_ORDERS_LIMIT: usize = 5;
/// 热销商品条数
const TOP_PRODUCTS_LIMIT: usize = 5;

/// 看板时间范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFilter {
    /// 今天
    Day,
    /// 本周（周日起）
    Week,
    /// 本月
    Month,
    /// 本年
    Year,
    #[default]
    All,
}

impl FromStr for DateFilter {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

impl DateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    /// 区间起点（含），`All` 返回 None
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let date = match self {
            Self::Day => today,
            Self::Week => today - Duration::days(i64::from(today.weekday().num_days_from_sunday())),
            Self::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?,
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
            Self::All => return None,
        };
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }
}

/// 看板服务
pub struct DashboardService {
    products: Arc<dyn ProductRepositoryTrait>,
    orders: Arc<dyn OrderRepositoryTrait>,
    customers: Arc<dyn CustomerRepositoryTrait>,
}

impl DashboardService {
    pub fn new(
        products: Arc<dyn ProductRepositoryTrait>,
        orders: Arc<dyn OrderRepositoryTrait>,
        customers: Arc<dyn CustomerRepositoryTrait>,
    ) -> Self {
        Self {
            products,
            orders,
            customers,
        }
    }

    /// 生成看板数据
    #[instrument(skip(self))]
    pub async fn dashboard(&self, filter: DateFilter) -> Result<Dashboard> {
        let (products, orders, total_users) = futures::try_join!(
            self.products.list(),
            self.orders.list(None),
            self.customers.count(),
        )?;

        let start = filter.start(Utc::now());
        let filtered: Vec<Order> = orders
            .into_iter()
            .filter(|o| start.is_none_or(|s| o.created_at >= s))
            .collect();

        let stats = DashboardStats {
            total_products: products.len() as i64,
            total_orders: filtered.len(),
            total_users,
            total_revenue: Self::revenue(&filtered),
            orders_by_status: Self::count_by_status(&filtered),
        };

        let low_stock_products = products
            .into_iter()
            .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
            .collect();

        let top_products = Self::top_products(&filtered);

        // 订单仓储已按创建时间倒序返回
        let recent_orders = filtered.into_iter().take(RECENT_ORDERS_LIMIT).collect();

        Ok(Dashboard {
            stats,
            low_stock_products,
            recent_orders,
            top_products,
            date_filter: filter.as_str().to_string(),
        })
    }

    /// 营收只计已送达订单
    fn revenue(orders: &[Order]) -> Decimal {
        orders
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.total)
            .sum()
    }

    fn count_by_status(orders: &[Order]) -> OrdersByStatus {
        let mut counts = OrdersByStatus::default();
        for order in orders {
            let slot = match order.status {
                OrderStatus::Pending => &mut counts.pending,
                OrderStatus::Confirmed => &mut counts.confirmed,
                OrderStatus::Processing => &mut counts.processing,
                OrderStatus::Shipped => &mut counts.shipped,
                OrderStatus::Delivered => &mut counts.delivered,
                OrderStatus::Cancelled => &mut counts.cancelled,
            };
            *slot += 1;
        }
        counts
    }

    /// 按销量排序的热销商品，销量相同时保持首次出现的顺序
    fn top_products(orders: &[Order]) -> Vec<TopProduct> {
        let mut index: HashMap<&ProductId, usize> = HashMap::new();
        let mut sales: Vec<TopProduct> = Vec::new();

        for item in orders.iter().flat_map(|o| o.items.iter()) {
            let position = *index.entry(&item.product_id).or_insert_with(|| {
                sales.push(TopProduct {
                    id: item.product_id.clone(),
                    name: item.name.clone(),
                    quantity: 0,
                    revenue: Decimal::ZERO,
                });
                sales.len() - 1
            });
            let entry = &mut sales[position];
            entry.quantity += i64::from(item.quantity);
            entry.revenue += item.subtotal();
        }

        sales.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        sales.truncate(TOP_PRODUCTS_LIMIT);
        sales
    }
}
