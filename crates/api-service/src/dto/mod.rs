//! 数据传输对象（DTO）模块

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
