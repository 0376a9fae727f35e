// ==========================================
// 论坛讨论迁移引擎 - 审计事件发布
// ==========================================
// 职责: 定义讨论迁移事件及其发布包装
// 说明: Engine 层定义事件，AuditSink 实现落地（仓储/空操作）
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{AuditEvent, AuditEventType, Discussion, Forum};
use crate::engine::ports::{AuditSink, CollaboratorResult};

// ==========================================
// 讨论迁移事件
// ==========================================

/// 讨论迁移事件
///
/// 携带迁移前的讨论、源论坛、目标论坛快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionMovedEvent {
    pub discussion_id: i64,
    pub from_forum_id: i64,
    pub to_forum_id: i64,
    pub actor: i64,
    pub occurred_at: NaiveDateTime,
    /// 迁移前的讨论
    pub discussion_snapshot: Discussion,
    pub source_forum_snapshot: Forum,
    pub target_forum_snapshot: Forum,
}

impl DiscussionMovedEvent {
    pub fn new(
        discussion: &Discussion,
        source_forum: &Forum,
        target_forum: &Forum,
        actor: i64,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            discussion_id: discussion.id,
            from_forum_id: source_forum.id,
            to_forum_id: target_forum.id,
            actor,
            occurred_at,
            discussion_snapshot: discussion.clone(),
            source_forum_snapshot: source_forum.clone(),
            target_forum_snapshot: target_forum.clone(),
        }
    }

    /// 转换为审计记录（上下文为目标论坛）
    pub fn to_audit_event(&self) -> AuditEvent {
        AuditEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: AuditEventType::DiscussionMoved.as_str().to_string(),
            object_id: self.discussion_id,
            context_forum_id: self.to_forum_id,
            actor: self.actor,
            created_at: self.occurred_at,
            other_json: json!({
                "fromforumid": self.from_forum_id,
                "toforumid": self.to_forum_id,
            }),
            snapshots_json: json!({
                "forumx_discussions": [self.discussion_snapshot],
                "forumx": [self.source_forum_snapshot, self.target_forum_snapshot],
            }),
        }
    }
}

// ==========================================
// 审计事件发布
// ==========================================

/// 空操作审计落地
///
/// 用于不需要审计的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpAuditSink;

impl AuditSink for NoOpAuditSink {
    fn record(&self, event: &AuditEvent) -> CollaboratorResult<()> {
        tracing::debug!(
            "NoOpAuditSink: 跳过审计记录 - event_type={}, object_id={}",
            event.event_type,
            event.object_id
        );
        Ok(())
    }
}

/// 审计事件发布器
///
/// 简化 Option<Arc<dyn AuditSink>> 的使用
pub struct AuditEventEmitter {
    inner: Option<Arc<dyn AuditSink>>,
}

impl AuditEventEmitter {
    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self { inner: Some(sink) }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有落地端）
    ///
    /// # 返回
    /// - `Ok(event_id)`: 审计记录ID
    pub fn emit(&self, event: &DiscussionMovedEvent) -> CollaboratorResult<String> {
        let record = event.to_audit_event();
        match &self.inner {
            Some(sink) => {
                sink.record(&record)?;
                tracing::info!(
                    event_id = %record.event_id,
                    discussion_id = event.discussion_id,
                    from_forum_id = event.from_forum_id,
                    to_forum_id = event.to_forum_id,
                    "讨论迁移审计已记录"
                );
            }
            None => {
                tracing::debug!(
                    "AuditEventEmitter: 未配置落地端，跳过事件 - discussion_id={}",
                    event.discussion_id
                );
            }
        }
        Ok(record.event_id)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for AuditEventEmitter {
    fn default() -> Self {
        Self::none()
    }
}
