//! 订单服务错误类型
//!
//! 定义服务层的业务错误和系统错误。
//! 错误消息直接面向店铺前端展示，因此使用葡萄牙语（pt-BR）。

use thiserror::Error;

/// 订单服务错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    // === 参数校验 ===
    #[error("{0}")]
    Validation(String),

    // === 下单相关错误 ===
    /// 购物车中引用的商品不存在（展示购物车里的名称）
    #[error("Produto {0} não encontrado")]
    CartItemNotFound(String),

    #[error("Estoque insuficiente para {product}. Disponível: {available}")]
    InsufficientStock { product: String, available: i32 },

    /// 读取后订单状态已被并发请求改变
    #[error("O pedido foi alterado por outra operação, tente novamente")]
    StatusConflict(String),

    // === 资源不存在 ===
    #[error("Produto não encontrado")]
    ProductNotFound(String),

    #[error("Pedido não encontrado")]
    OrderNotFound(String),

    #[error("Cliente não encontrado")]
    CustomerNotFound(String),

    #[error("Usuário não encontrado")]
    UserNotFound(String),

    // === 用户相关错误 ===
    #[error("Email já cadastrado")]
    EmailAlreadyRegistered,

    #[error("Email já está em uso")]
    EmailInUse,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Senha atual incorreta")]
    WrongPassword,

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 订单服务 Result 类型别名
pub type Result<T> = std::result::Result<T, OrderError>;

impl OrderError {
    /// 空购物车
    pub fn empty_cart() -> Self {
        Self::Validation("Carrinho vazio".to_string())
    }

    /// 缺少联系人信息
    pub fn missing_contact() -> Self {
        Self::Validation("Nome e telefone são obrigatórios".to_string())
    }

    /// 非法订单状态
    pub fn invalid_status() -> Self {
        Self::Validation("Status inválido".to_string())
    }

    /// 检查是否为业务错误（非系统错误）
    ///
    /// 业务错误不重试，直接返回给调用方
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CartItemNotFound(_) => "CART_ITEM_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::StatusConflict(_) => "STATUS_CONFLICT",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
