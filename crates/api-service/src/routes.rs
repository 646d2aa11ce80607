//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射。
//! 同一路径下公开方法与受保护方法并存（如商品的 GET 与 PUT），
//! 因此认证与管理员检查挂在方法级路由上，而不是整组路由上。

use axum::{
    Router, middleware,
    routing::{MethodRouter, delete, get, post, put},
};

use crate::{
    handlers,
    middleware::{auth_middleware, require_admin},
    state::AppState,
};

/// 需要登录
fn authenticated(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// 需要管理员身份（后添加的 layer 先执行，认证在前）
fn admin(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// 认证路由
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/profile",
            authenticated(
                state,
                get(handlers::auth::get_profile).put(handlers::auth::update_profile),
            ),
        )
        .route(
            "/auth/password",
            authenticated(state, put(handlers::auth::change_password)),
        )
}

/// 商品路由：查询公开，维护需要管理员
fn product_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handlers::products::list_products)
                .merge(admin(state, post(handlers::products::create_product))),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product).merge(admin(
                state,
                put(handlers::products::update_product).delete(handlers::products::delete_product),
            )),
        )
}

/// 订单路由：下单公开
fn order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order)
                .merge(admin(state, get(handlers::orders::list_orders))),
        )
        .route(
            "/orders/my-orders",
            authenticated(state, get(handlers::orders::my_orders)),
        )
        .route(
            "/orders/{id}",
            authenticated(state, get(handlers::orders::get_order)),
        )
        .route(
            "/orders/{id}/status",
            admin(state, put(handlers::orders::update_status)),
        )
}

/// 后台路由
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", admin(state, get(handlers::admin::dashboard)))
        .route("/admin/users", admin(state, get(handlers::admin::list_users)))
        .route(
            "/admin/customers",
            admin(state, get(handlers::admin::list_customers)),
        )
        .route(
            "/admin/customers/{id}/orders",
            admin(state, get(handlers::admin::customer_orders)),
        )
        .route(
            "/admin/categories",
            admin(state, get(handlers::admin::list_categories)),
        )
        .route(
            "/admin/orders/{id}",
            admin(state, delete(handlers::admin::delete_order)),
        )
}

/// 组装所有 API 路由，挂载在 `/api` 下
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(auth_routes(state))
        .merge(product_routes(state))
        .merge(order_routes(state))
        .merge(admin_routes(state))
}
