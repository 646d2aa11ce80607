//! 订单相关的 HTTP 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pods_orders::OrderId;
use pods_orders::dto::CreateOrderResponse;
use tracing::instrument;

use crate::dto::{
    CreateOrderBody, OrderListParams, OrderListResponse, OrderResponse, UpdateStatusRequest,
};
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 下单（无需登录）
///
/// POST /api/orders
#[instrument(skip_all, fields(item_count = body.items.as_ref().map_or(0, Vec::len)))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let response = state.orders.create_order(body.into()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// 全部订单，可按状态过滤
///
/// GET /api/orders?status=
#[instrument(skip_all, fields(status = ?params.status))]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<OrderListResponse>> {
    let orders = state.orders.list_orders(params.status()?).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// 当前用户的订单
///
/// 订单以下单时填写的联系方式关联，这里按账号邮箱匹配
///
/// GET /api/orders/my-orders
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OrderListResponse>> {
    let orders = state.orders.list_orders_by_contact(&user.email).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// 单个订单，仅管理员或订单本人可见
///
/// GET /api/orders/{id}
#[instrument(skip_all, fields(order_id = %id))]
pub async fn get_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state.orders.get_order(&OrderId::new(id)).await?;

    if !current.is_admin() && order.customer_contact.as_str() != current.0.email {
        return Err(ApiError::access_denied());
    }

    Ok(Json(OrderResponse { order }))
}

/// 更新订单状态
///
/// PUT /api/orders/{id}/status
#[instrument(skip_all, fields(order_id = %id, status = ?req.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let status = req.status()?;
    let order = state
        .orders
        .update_order_status(&OrderId::new(id), status)
        .await?;
    Ok(Json(OrderResponse { order }))
}
