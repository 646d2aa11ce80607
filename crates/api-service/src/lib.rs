//! Pods in Box 店铺 API 服务
//!
//! 提供店铺前端与后台使用的 REST API。
//!
//! ## 核心功能
//!
//! - **认证**：注册、登录、个人资料，JWT 鉴权
//! - **商品**：公开查询，管理员维护
//! - **订单**：匿名下单并生成 WhatsApp 确认链接，管理员流转状态
//! - **后台**：看板、用户与客户查询
//!
//! ## 模块结构
//!
//! - `auth`: JWT 与密码处理
//! - `bootstrap`: 启动时写入默认数据
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证与权限中间件
//! - `routes`: 路由配置
//! - `state`: 应用状态

pub mod auth;
pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use state::AppState;
