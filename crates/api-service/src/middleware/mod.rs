//! 中间件模块
//!
//! 提供认证与管理员权限检查中间件

mod auth;
mod permission;

pub use auth::{CurrentUser, auth_middleware};
pub use permission::require_admin;
