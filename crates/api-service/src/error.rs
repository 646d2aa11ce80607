//! HTTP 错误类型定义
//!
//! 将领域错误映射为 HTTP 状态码与 `{ "error", "code" }` 响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pods_orders::OrderError;
use serde_json::json;

/// 5xx 响应统一使用的提示，详细原因只写日志
const INTERNAL_MESSAGE: &str = "Erro interno do servidor";

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("{0}")]
    Unauthorized(String),
    #[error("Token inválido ou expirado")]
    InvalidToken,
    #[error("{0}")]
    Forbidden(String),

    // 验证错误
    #[error("{0}")]
    Validation(String),

    // 领域错误
    #[error(transparent)]
    Order(#[from] OrderError),

    // 系统错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 缺少 Bearer Token
    pub fn missing_token() -> Self {
        Self::Unauthorized("Token de acesso não fornecido".to_string())
    }

    /// 非管理员访问后台接口
    pub fn admin_only() -> Self {
        Self::Forbidden("Acesso restrito a administradores".to_string())
    }

    /// 访问他人的订单
    pub fn access_denied() -> Self {
        Self::Forbidden("Acesso negado".to_string())
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Order(err) => Self::order_status(err),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn order_status(err: &OrderError) -> StatusCode {
        match err {
            // 购物车里的商品不存在属于请求内容错误，不是 404
            OrderError::Validation(_)
            | OrderError::CartItemNotFound(_)
            | OrderError::InsufficientStock { .. }
            | OrderError::EmailAlreadyRegistered
            | OrderError::EmailInUse => StatusCode::BAD_REQUEST,

            OrderError::ProductNotFound(_)
            | OrderError::OrderNotFound(_)
            | OrderError::CustomerNotFound(_)
            | OrderError::UserNotFound(_) => StatusCode::NOT_FOUND,

            OrderError::InvalidCredentials | OrderError::WrongPassword => StatusCode::UNAUTHORIZED,

            OrderError::StatusConflict(_) => StatusCode::CONFLICT,

            OrderError::Database(_) | OrderError::Serialization(_) | OrderError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Order(err) => err.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "请求处理失败");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": message,
            "code": self.error_code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换，只取第一条字段消息
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|list| list.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        Self::Validation(message)
    }
}

/// API 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
