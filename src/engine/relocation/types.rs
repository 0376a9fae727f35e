use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Capability, Discussion};
use crate::engine::ports::CollaboratorError;
use crate::engine::subscription_cache::SubscriptionCacheError;
use crate::repository::RepositoryError;

// ==========================================
// MoveEndpoint - 迁移端点
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveEndpoint {
    Source,
    Target,
}

impl fmt::Display for MoveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveEndpoint::Source => write!(f, "source"),
            MoveEndpoint::Target => write!(f, "target"),
        }
    }
}

// ==========================================
// MoveError - 迁移错误
// ==========================================
// 业务类错误均发生在任何改写之前
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("讨论不存在: discussion_id={discussion_id}")]
    DiscussionNotFound { discussion_id: i64 },

    #[error("目标论坛不存在: forum_id={forum_id}")]
    TargetNotFound { forum_id: i64 },

    #[error("权限不足: capability={capability}, forum_id={forum_id}")]
    Forbidden { capability: Capability, forum_id: i64 },

    #[error("单讨论论坛不支持迁移: forum_id={forum_id}, endpoint={endpoint}")]
    UnsupportedForumType { forum_id: i64, endpoint: MoveEndpoint },

    #[error("目标论坛不可见: forum_id={forum_id}")]
    TargetNotVisible { forum_id: i64 },

    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Cache(#[from] SubscriptionCacheError),

    #[error("外部协作方调用失败: {0}")]
    Collaborator(String),
}

impl From<CollaboratorError> for MoveError {
    fn from(err: CollaboratorError) -> Self {
        MoveError::Collaborator(err.to_string())
    }
}

impl MoveError {
    /// 是否为业务校验类错误（保证无任何改写）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MoveError::DiscussionNotFound { .. }
                | MoveError::TargetNotFound { .. }
                | MoveError::Forbidden { .. }
                | MoveError::UnsupportedForumType { .. }
                | MoveError::TargetNotVisible { .. }
        )
    }
}

pub type MoveResult<T> = Result<T, MoveError>;

// ==========================================
// MoveWarning - 非致命警告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveWarning {
    AttachmentRelocationPartialFailure { discussion_id: i64 },
    FeedInvalidationFailed { forum_id: i64, message: String },
    /// 数据已落地，审计事件未写入
    AuditRecordFailed { message: String },
}

// ==========================================
// MoveReport - 迁移结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    /// 迁移后的讨论
    pub discussion: Discussion,
    pub from_forum_id: i64,
    pub to_forum_id: i64,
    pub subscribers_considered: usize, // 参与对账的用户数
    pub unsubscribed: usize,           // 强制退订记录数
    pub subscribed: usize,             // 强制订阅记录数
    pub subscriptions_dropped: usize,  // 无查看权限被丢弃的订阅数
    pub read_rows_moved: usize,        // 迁移的阅读记录数
    pub audit_event_id: Option<String>, // 审计写入失败时为 None
    pub warnings: Vec<MoveWarning>,
}

impl MoveReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
