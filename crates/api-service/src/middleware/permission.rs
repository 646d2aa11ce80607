//! 权限检查中间件
//!
//! 后台接口只允许管理员访问，须放在认证中间件之后

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::CurrentUser;
use crate::error::ApiError;

/// 管理员检查中间件
///
/// # 示例
/// ```ignore
/// put(update_status).route_layer(axum::middleware::from_fn(require_admin))
/// ```
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(user) if user.is_admin() => next.run(request).await,
        Some(_) => ApiError::admin_only().into_response(),
        None => ApiError::missing_token().into_response(),
    }
}
