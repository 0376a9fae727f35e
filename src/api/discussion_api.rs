// ==========================================
// 论坛讨论迁移引擎 - 讨论迁移 API
// ==========================================
// 职责: 请求校验、会话令牌、调用迁移执行器、组装本地化响应
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::session::SessionTokenRegistry;
use crate::engine::relocation::{MoveReport, MoveTransactionExecutor, MoveWarning};
use crate::i18n::{t, t_with_args};
use crate::repository::ForumRepository;

// ==========================================
// MoveResponse - 迁移响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub discussion_id: i64,
    pub forum_id: i64,
    /// 成功跳转地址（move=-1 表示迁移成功）
    pub redirect_url: String,
    /// 本地化成功提示
    pub notice: String,
    /// 本地化警告
    pub warnings: Vec<String>,
    pub report: MoveReport,
}

/// 迁移成功后的跳转地址
pub fn discussion_redirect_url(discussion_id: i64) -> String {
    format!("/mod/forumx/discuss.php?d={}&move=-1", discussion_id)
}

// ==========================================
// DiscussionApi - 讨论迁移 API
// ==========================================
pub struct DiscussionApi {
    executor: Arc<MoveTransactionExecutor>,
    forum_repo: Arc<ForumRepository>,
    sessions: Arc<SessionTokenRegistry>,
    session_token_required: bool,
}

impl DiscussionApi {
    pub fn new(
        executor: Arc<MoveTransactionExecutor>,
        forum_repo: Arc<ForumRepository>,
        sessions: Arc<SessionTokenRegistry>,
        session_token_required: bool,
    ) -> Self {
        Self {
            executor,
            forum_repo,
            sessions,
            session_token_required,
        }
    }

    /// 为用户签发一次性会话令牌
    pub fn issue_session_token(&self, user_id: i64) -> ApiResult<String> {
        self.sessions.issue(user_id)
    }

    /// 迁移讨论
    ///
    /// # 参数
    /// - discussion_id: 讨论ID
    /// - target_forum_id: 目标论坛ID
    /// - caller: 操作人
    /// - session_token: 一次性会话令牌
    ///
    /// # 返回
    /// - Ok(MoveResponse): 迁移完成
    /// - Err(ApiError): 令牌无效或迁移失败
    pub fn move_discussion(
        &self,
        discussion_id: i64,
        target_forum_id: i64,
        caller: i64,
        session_token: Option<&str>,
    ) -> ApiResult<MoveResponse> {
        if discussion_id <= 0 {
            return Err(ApiError::InvalidInput(format!("讨论ID无效: {}", discussion_id)));
        }
        if target_forum_id <= 0 {
            return Err(ApiError::InvalidInput(format!("目标论坛ID无效: {}", target_forum_id)));
        }

        match session_token {
            Some(token) => self.sessions.consume(token, caller)?,
            None if self.session_token_required => return Err(ApiError::invalid_session_token()),
            None => {}
        }

        let report = self
            .executor
            .move_discussion(discussion_id, target_forum_id, caller)?;

        let forum_name = self
            .forum_repo
            .find_forum(report.to_forum_id)?
            .map(|f| f.name)
            .unwrap_or_else(|| report.to_forum_id.to_string());
        let notice = t_with_args("forumx.discussionmoved", &[("forum", &forum_name)]);
        let warnings = report.warnings.iter().map(localize_warning).collect();

        Ok(MoveResponse {
            discussion_id: report.discussion.id,
            forum_id: report.to_forum_id,
            redirect_url: discussion_redirect_url(report.discussion.id),
            notice,
            warnings,
            report,
        })
    }
}

fn localize_warning(warning: &MoveWarning) -> String {
    match warning {
        MoveWarning::AttachmentRelocationPartialFailure { .. } => {
            t("forumx.movedmarkedattachmentsfailed")
        }
        MoveWarning::FeedInvalidationFailed { forum_id, .. } => t_with_args(
            "forumx.feedinvalidationfailed",
            &[("forum", &forum_id.to_string())],
        ),
        MoveWarning::AuditRecordFailed { .. } => t("forumx.auditrecordfailed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url() {
        assert_eq!(discussion_redirect_url(42), "/mod/forumx/discuss.php?d=42&move=-1");
    }

    #[test]
    fn test_audit_warning_is_localized() {
        let msg = localize_warning(&MoveWarning::AuditRecordFailed {
            message: "down".to_string(),
        });
        assert!(!msg.is_empty());
        assert_ne!(msg, "forumx.auditrecordfailed");
    }
}
