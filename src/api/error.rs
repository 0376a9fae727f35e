// ==========================================
// 论坛讨论迁移引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将引擎/仓储错误转换为用户可读的本地化消息
// ==========================================

use crate::engine::relocation::{MoveEndpoint, MoveError};
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 缺失或已使用的一次性会话令牌
    #[error("{0}")]
    InvalidSessionToken(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_session_token() -> Self {
        ApiError::InvalidSessionToken(t("forumx.invalidsessiontoken"))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 MoveError 转换
// ==========================================
impl From<MoveError> for ApiError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::DiscussionNotFound { discussion_id } => ApiError::NotFound(t_with_args(
                "forumx.invaliddiscussionid",
                &[("id", &discussion_id.to_string())],
            )),
            MoveError::TargetNotFound { .. } => {
                ApiError::NotFound(t("forumx.cannotmovetonotexist"))
            }
            MoveError::Forbidden { capability, .. } => ApiError::PermissionDenied(t_with_args(
                "forumx.nopermission",
                &[("capability", capability.as_str())],
            )),
            MoveError::UnsupportedForumType { endpoint, .. } => match endpoint {
                MoveEndpoint::Source => {
                    ApiError::BusinessRuleViolation(t("forumx.cannotmovefromsingleforum"))
                }
                MoveEndpoint::Target => {
                    ApiError::BusinessRuleViolation(t("forumx.cannotmovetosingleforum"))
                }
            },
            MoveError::TargetNotVisible { .. } => {
                ApiError::PermissionDenied(t("forumx.cannotmovenotvisible"))
            }
            MoveError::Storage(e) => e.into(),
            MoveError::Cache(e) => ApiError::InternalError(e.to_string()),
            MoveError::Collaborator(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Capability;
    use crate::engine::SubscriptionCacheError;

    #[test]
    fn test_move_error_conversion() {
        let api_err: ApiError = MoveError::TargetNotFound { forum_id: 5 }.into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let api_err: ApiError = MoveError::Forbidden {
            capability: Capability::MoveDiscussions,
            forum_id: 1,
        }
        .into();
        match api_err {
            ApiError::PermissionDenied(msg) => assert!(msg.contains("mod/forumx:movediscussions")),
            other => panic!("Expected PermissionDenied, got {:?}", other),
        }

        let api_err: ApiError = MoveError::UnsupportedForumType {
            forum_id: 1,
            endpoint: MoveEndpoint::Source,
        }
        .into();
        assert!(matches!(api_err, ApiError::BusinessRuleViolation(_)));

        let api_err: ApiError = MoveError::TargetNotVisible { forum_id: 2 }.into();
        assert!(matches!(api_err, ApiError::PermissionDenied(_)));

        let api_err: ApiError = MoveError::Cache(SubscriptionCacheError::NotFilled { forum_id: 3 }).into();
        assert!(matches!(api_err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "forumx".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = MoveError::Storage(repo_err).into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("forumx"));
                assert!(msg.contains("42"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }
}
