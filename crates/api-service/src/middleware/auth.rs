//! JWT 认证中间件
//!
//! 验证请求中的 Bearer Token，按 Token 中的用户 ID 加载当前用户并注入请求扩展

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use pods_orders::{OrderError, UserId, UserProfile};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 当前登录用户
///
/// 角色取自存储中的最新记录，而不是 Token 签发时的快照
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }
}

/// 认证中间件
///
/// - 缺少 Token：401
/// - Token 无效或过期：403
/// - Token 对应的用户已不存在：404
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserProfile> {
    let token = bearer_token(headers).ok_or_else(ApiError::missing_token)?;
    let claims = state.jwt_manager.verify_token(token)?;

    let user_id = UserId::new(claims.sub);
    let user = state
        .repos
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| OrderError::UserNotFound(user_id.to_string()))?;

    Ok(UserProfile::from(&user))
}

/// 从 Authorization 头提取 Bearer Token
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::missing_token)
    }
}
