// ==========================================
// 论坛讨论迁移引擎 - 引擎层
// ==========================================
// 职责: 订阅解析、对账规划、迁移授权与执行
// 红线: Engine 不拼 SQL, 存储访问经由 Repository 或 ports 中的 trait
// ==========================================

pub mod attachments;
pub mod authorization;
pub mod events;
pub mod feed;
pub mod ports;
pub mod reconciliation;
pub mod relocation;
pub mod repositories;
pub mod subscribers;
pub mod subscription_cache;
pub mod subscription_resolver;

// 重导出核心引擎
pub use attachments::{FileAttachmentRelocator, NoOpAttachmentRelocator};
pub use authorization::{authorize, MoveAuthorizationFacts};
pub use events::{AuditEventEmitter, DiscussionMovedEvent, NoOpAuditSink};
pub use feed::{NoOpFeedInvalidator, RssFeedInvalidator};
pub use ports::{
    AttachmentRelocator, AuditSink, CapabilityChecker, CollaboratorError, CollaboratorResult,
    FeedInvalidator, SubscriberEnumerator, SubscriptionLoader,
};
pub use reconciliation::{
    PlanAction, ReconciliationPlan, ReconciliationPlanner, SubscriptionSignals,
};
pub use relocation::{
    MoveEndpoint, MoveError, MoveReport, MoveResult, MoveTransactionExecutor, MoveWarning,
};
pub use repositories::{RelocationCollaborators, RelocationRepositories};
pub use subscribers::RepositorySubscriberEnumerator;
pub use subscription_cache::{SubscriptionCache, SubscriptionCacheError};
pub use subscription_resolver::SubscriptionStateResolver;
