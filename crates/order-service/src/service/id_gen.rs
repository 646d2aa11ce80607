//! 标识符生成
//!
//! 格式：`<prefix>-<unix 毫秒>-<9 位 base36 随机串>`

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

/// 随机后缀长度
const SUFFIX_LEN: usize = 9;

/// 标识符生成器
pub trait IdGenerator: Send + Sync {
    fn generate(&self, prefix: &str) -> String;
}

/// 基于时间戳和随机串的生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl TimestampIdGenerator {
    fn random_suffix() -> String {
        let mut n = Uuid::new_v4().as_u128();
        (0..SUFFIX_LEN)
            .map(|_| {
                let digit = (n % 36) as u32;
                n /= 36;
                char::from_digit(digit, 36).unwrap_or('0')
            })
            .collect()
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self, prefix: &str) -> String {
        format!(
            "{}-{}-{}",
            prefix,
            Utc::now().timestamp_millis(),
            Self::random_suffix()
        )
    }
}

/// 递增序号生成器，输出可预测，用于测试
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }
}
