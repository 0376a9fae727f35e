// ==========================================
// 论坛讨论迁移引擎 - 核心库
// ==========================================
// 职责: 讨论跨论坛迁移 + 讨论级订阅对账
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 订阅解析、对账、迁移
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 依赖装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Capability, DiscussionPreference, ForumType, GroupScope, SubscriptionMode,
};

// 领域实体
pub use domain::{
    AuditEvent, CourseModule, Discussion, DiscussionSubscription, Forum, ForumSubscription,
    ReadRecord,
};

// 引擎
pub use engine::{
    MoveError, MoveReport, MoveTransactionExecutor, MoveWarning, ReconciliationPlanner,
    SubscriptionCache, SubscriptionStateResolver,
};

// API
pub use api::{ApiError, ApiResult, DiscussionApi, MoveResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "论坛讨论迁移引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
