//! HTTP 请求处理器

pub mod admin;
pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
