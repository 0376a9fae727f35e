// ==========================================
// 论坛讨论迁移引擎 - 讨论迁移执行器
// ==========================================
// 流程: 加载 -> 校验/授权 -> 附件 -> 订阅对账 -> 事务落地 -> 审计 -> RSS 失效
// 红线: 校验与授权阶段不产生任何改写
// 红线: 讨论 forum_id / 阅读记录 / 讨论级订阅在同一事务内改写
// ==========================================

mod core;
mod types;


pub use core::MoveTransactionExecutor;
pub use types::{MoveEndpoint, MoveError, MoveReport, MoveResult, MoveWarning};
