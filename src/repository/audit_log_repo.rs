// ==========================================
// 论坛讨论迁移引擎 - 审计日志数据仓储
// ==========================================
// 对齐: audit_log 表
// 红线: 所有迁移必须记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::AuditLogRepository;
