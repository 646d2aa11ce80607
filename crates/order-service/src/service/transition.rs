//! 订单状态流转表
//!
//! 六个状态之间任意流转都被允许，流转本身只改 status 与 updatedAt。
//! 只有跨越"已取消"边界的两类流转带有库存与客户聚合副作用：
//!
//! | from \ to     | cancelled | 其他    |
//! |---------------|-----------|---------|
//! | 非 cancelled  | Restore   | None    |
//! | cancelled     | None      | Reapply |

use crate::models::OrderStatus;

/// 状态流转附带的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// 无副作用
    None,
    /// 进入取消：归还库存，客户 orderCount -1、totalSpent -total
    Restore,
    /// 离开取消：先校验再扣减库存，客户 orderCount +1、totalSpent +total
    Reapply,
}

impl StockEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Restore => "restore",
            Self::Reapply => "reapply",
        }
    }
}

/// 查询 (from, to) 对应的副作用
pub fn effect_of(from: OrderStatus, to: OrderStatus) -> StockEffect {
    match (from.is_cancelled(), to.is_cancelled()) {
        (false, true) => StockEffect::Restore,
        (true, false) => StockEffect::Reapply,
        (false, false) | (true, true) => StockEffect::None,
    }
}
