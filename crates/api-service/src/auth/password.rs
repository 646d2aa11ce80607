//! 密码处理
//!
//! 提供密码哈希和验证功能

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::ApiError;

/// bcrypt 哈希的前缀
const BCRYPT_PREFIX: &str = "$2";

/// 对密码进行哈希处理
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST).map_err(|e| ApiError::Internal(format!("密码哈希失败: {}", e)))
}

/// 验证密码
///
/// 早期种子数据存的是明文，存储值不是 bcrypt 哈希时按明文比较
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    if !stored.starts_with(BCRYPT_PREFIX) {
        return Ok(password == stored);
    }
    verify(password, stored).map_err(|e| ApiError::Internal(format!("密码验证失败: {}", e)))
}
