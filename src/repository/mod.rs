// ==========================================
// 论坛讨论迁移引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 所有仓储共享同一 Arc<Mutex<Connection>>
// ==========================================

pub mod audit_log_repo;
pub mod capability_repo;
pub mod enrolment_repo;
pub mod error;
pub mod forum_repo;
pub mod read_tracking_repo;
pub mod relocation_repo;
pub mod subscription_repo;

// 重导出核心仓储
pub use audit_log_repo::AuditLogRepository;
pub use capability_repo::CapabilityRepository;
pub use enrolment_repo::EnrolmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use forum_repo::ForumRepository;
pub use read_tracking_repo::ReadTrackingRepository;
pub use relocation_repo::{DiscussionRelocationRepository, RelocationWrite, RelocationWriteSummary};
pub use subscription_repo::SubscriptionRepository;
