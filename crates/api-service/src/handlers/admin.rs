//! 后台管理 HTTP 处理器
//!
//! 看板、用户与客户查询、分类列表、订单删除

use axum::{
    Json,
    extract::{Path, Query, State},
};
use pods_orders::dto::Dashboard;
use pods_orders::{CustomerId, OrderError, OrderId, UserProfile};
use tracing::instrument;

use crate::dto::{
    CategoryListResponse, CustomerListResponse, CustomerOrdersResponse, DashboardParams,
    MessageResponse, UserListResponse,
};
use crate::error::Result;
use crate::state::AppState;

/// GET /api/admin/dashboard?dateFilter=
#[instrument(skip_all, fields(date_filter = ?params.date_filter))]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>> {
    let dashboard = state.dashboard.dashboard(params.date_filter()).await?;
    Ok(Json(dashboard))
}

/// 用户列表（不含密码）
///
/// GET /api/admin/users
#[instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>> {
    let users = state
        .repos
        .users
        .list()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();
    Ok(Json(UserListResponse { users }))
}

/// 客户列表，最近更新在前
///
/// GET /api/admin/customers
#[instrument(skip_all)]
pub async fn list_customers(State(state): State<AppState>) -> Result<Json<CustomerListResponse>> {
    let customers = state.repos.customers.list().await?;
    Ok(Json(CustomerListResponse { customers }))
}

/// 某客户的订单
///
/// GET /api/admin/customers/{id}/orders
#[instrument(skip_all, fields(customer_id = %id))]
pub async fn customer_orders(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerOrdersResponse>> {
    let id = CustomerId::new(id);
    let customer = state
        .repos
        .customers
        .find_by_id(&id)
        .await?
        .ok_or_else(|| OrderError::CustomerNotFound(id.to_string()))?;

    let orders = state
        .orders
        .list_orders_by_contact(customer.phone.as_str())
        .await?;

    Ok(Json(CustomerOrdersResponse { customer, orders }))
}

/// GET /api/admin/categories
#[instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<CategoryListResponse>> {
    let categories = state.catalog.category_names().await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// 删除订单记录，不影响库存与客户聚合
///
/// DELETE /api/admin/orders/{id}
#[instrument(skip_all, fields(order_id = %id))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.orders.delete_order(&OrderId::new(id)).await?;
    Ok(Json(MessageResponse::new("Pedido removido com sucesso")))
}
