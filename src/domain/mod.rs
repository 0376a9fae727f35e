// ==========================================
// 论坛讨论迁移引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体与封闭类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod forum;
pub mod read_tracking;
pub mod subscription;
pub mod types;

// 重导出核心类型
pub use audit::{AuditEvent, AuditEventType};
pub use forum::{CourseModule, Discussion, Forum};
pub use read_tracking::ReadRecord;
pub use subscription::{DiscussionSubscription, ForumSubscription};
pub use types::{Capability, DiscussionPreference, ForumType, GroupScope, SubscriptionMode};
