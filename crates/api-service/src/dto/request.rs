//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构。
//! 请求体字段缺失时按空值处理，由校验逻辑返回业务提示，而不是 JSON 解析错误。

use std::str::FromStr;

use pods_orders::dto::{CartItem, CreateOrderRequest};
use pods_orders::{DateFilter, NewProduct, OrderError, OrderStatus, ProductPatch, ProductQuery};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// 区分"字段缺失"与"显式 null"
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ==================== 认证 ====================

/// 注册请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Nome, email e senha são obrigatórios"))]
    pub name: String,
    #[validate(length(min = 1, message = "Nome, email e senha são obrigatórios"))]
    pub email: String,
    #[validate(length(min = 1, message = "Nome, email e senha são obrigatórios"))]
    pub password: String,
}

/// 登录请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email e senha são obrigatórios"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email e senha são obrigatórios"))]
    pub password: String,
}

/// 更新个人资料，空字段表示不修改
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// 修改密码
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 1, message = "Nova senha é obrigatória"))]
    pub new_password: String,
}

// ==================== 订单 ====================

/// 下单请求体
///
/// 店铺前端沿用 `customerEmail` 字段承载手机号。
/// 缺失与 null 一样按空值处理，交给下单校验返回提示。
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub items: Option<Vec<CartItem>>,
    pub customer_name: Option<String>,
    #[serde(alias = "customerPhone")]
    pub customer_email: Option<String>,
    pub address: Option<String>,
}

impl From<CreateOrderBody> for CreateOrderRequest {
    fn from(body: CreateOrderBody) -> Self {
        Self {
            items: body.items.unwrap_or_default(),
            customer_name: body.customer_name.unwrap_or_default(),
            customer_phone: body.customer_email.unwrap_or_default(),
            address: body.address,
        }
    }
}

/// 更新订单状态
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl UpdateStatusRequest {
    pub fn status(&self) -> Result<OrderStatus, OrderError> {
        self.status
            .as_deref()
            .ok_or_else(OrderError::invalid_status)?
            .parse()
    }
}

/// 订单列表过滤
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
}

impl OrderListParams {
    /// 空字符串视为不过滤
    pub fn status(&self) -> Result<Option<OrderStatus>, OrderError> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()
    }
}

// ==================== 商品 ====================

/// 商品列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl From<ProductListParams> for ProductQuery {
    /// 无法解析的价格与排序方式被忽略
    fn from(params: ProductListParams) -> Self {
        let price = |raw: Option<String>| raw.and_then(|v| Decimal::from_str(v.trim()).ok());
        Self {
            search: params.search,
            category: params.category,
            min_price: price(params.min_price),
            max_price: price(params.max_price),
            sort: params.sort.and_then(|s| s.parse().ok()),
        }
    }
}

/// 新建商品
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub category: String,
    pub stock: Option<i32>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_featured: Option<bool>,
    pub flavors: Option<Vec<String>>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name,
            flavor: req.flavor,
            description: req.description,
            price: req.price,
            original_price: req.original_price,
            image: req.image,
            category: req.category,
            stock: req.stock,
            is_new: req.is_new,
            is_best_seller: req.is_best_seller,
            is_featured: req.is_featured,
            flavors: req.flavors,
        }
    }
}

/// 商品部分更新
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// 显式传 null 清空划线价
    #[serde(deserialize_with = "double_option")]
    pub original_price: Option<Option<Decimal>>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_featured: Option<bool>,
    pub flavors: Option<Vec<String>>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            flavor: req.flavor,
            description: req.description,
            price: req.price,
            original_price: req.original_price,
            image: req.image,
            category: req.category,
            stock: req.stock,
            is_new: req.is_new,
            is_best_seller: req.is_best_seller,
            is_featured: req.is_featured,
            flavors: req.flavors,
        }
    }
}

// ==================== 后台 ====================

/// 看板查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub date_filter: Option<String>,
}

impl DashboardParams {
    /// 未知取值按全部时间处理
    pub fn date_filter(&self) -> DateFilter {
        self.date_filter
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}
