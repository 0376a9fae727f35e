// ==========================================
// 论坛讨论迁移引擎 - 外部协作方接口
// ==========================================
// 职责: 定义迁移引擎依赖的外部服务 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository / 文件系统适配器实现
// ==========================================

use std::error::Error;

use crate::domain::{
    AuditEvent, Capability, Discussion, DiscussionSubscription, Forum, ForumSubscription,
    GroupScope,
};

/// 协作方错误
pub type CollaboratorError = Box<dyn Error + Send + Sync>;

/// 协作方调用结果
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// 权限检查
pub trait CapabilityChecker: Send + Sync {
    /// 用户在论坛上下文中是否持有指定权限
    fn has_capability(
        &self,
        capability: Capability,
        forum_id: i64,
        user_id: i64,
    ) -> CollaboratorResult<bool>;
}

/// 附件迁移
pub trait AttachmentRelocator: Send + Sync {
    /// 迁移讨论附件
    ///
    /// # 返回
    /// - `true`: 全部成功（或无附件）
    /// - `false`: 部分失败（非致命，由调用方提示警告）
    fn relocate(&self, discussion: &Discussion, from_forum_id: i64, to_forum_id: i64) -> bool;
}

/// 潜在订阅者枚举
pub trait SubscriberEnumerator: Send + Sync {
    /// 论坛在分组范围内的潜在订阅者（含讨论级订阅用户），按用户ID升序
    fn subscribers_of(&self, forum: &Forum, group_scope: GroupScope) -> CollaboratorResult<Vec<i64>>;
}

/// 订阅缓存数据源
pub trait SubscriptionLoader: Send + Sync {
    fn load_forum_subscriptions(&self, forum_id: i64) -> CollaboratorResult<Vec<ForumSubscription>>;

    fn load_discussion_subscriptions(
        &self,
        forum_id: i64,
    ) -> CollaboratorResult<Vec<DiscussionSubscription>>;
}

/// 派生产物（RSS 订阅源）失效
pub trait FeedInvalidator: Send + Sync {
    fn invalidate(&self, forum: &Forum) -> CollaboratorResult<()>;
}

/// 审计记录落地
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> CollaboratorResult<()>;
}
