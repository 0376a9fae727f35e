use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike, Utc};
use tracing::instrument;

use super::types::{MoveError, MoveReport, MoveResult, MoveWarning};
use crate::domain::{Capability, Discussion, DiscussionPreference, DiscussionSubscription, Forum};
use crate::engine::authorization::{authorize, MoveAuthorizationFacts};
use crate::engine::events::{AuditEventEmitter, DiscussionMovedEvent};
use crate::engine::reconciliation::{
    PlanAction, ReconciliationPlan, ReconciliationPlanner, SubscriptionSignals,
};
use crate::engine::repositories::{RelocationCollaborators, RelocationRepositories};
use crate::engine::subscription_cache::SubscriptionCache;
use crate::engine::subscription_resolver::SubscriptionStateResolver;
use crate::repository::{RelocationWrite, RepositoryError};

// ==========================================
// MoveTransactionExecutor - 讨论迁移执行器
// ==========================================
pub struct MoveTransactionExecutor {
    repos: RelocationRepositories,
    collaborators: RelocationCollaborators,
    cache: Arc<SubscriptionCache>,
    audit: AuditEventEmitter,
    planner: ReconciliationPlanner,
}

/// 订阅对账的落地结果
struct SubscriptionRewrite {
    rows: Vec<DiscussionSubscription>,
    unsubscribed: usize,
    subscribed: usize,
    dropped: usize,
}

impl MoveTransactionExecutor {
    pub fn new(
        repos: RelocationRepositories,
        collaborators: RelocationCollaborators,
        cache: Arc<SubscriptionCache>,
        audit: AuditEventEmitter,
    ) -> Self {
        Self {
            repos,
            collaborators,
            cache,
            audit,
            planner: ReconciliationPlanner::new(),
        }
    }

    pub fn cache(&self) -> &Arc<SubscriptionCache> {
        &self.cache
    }

    /// 将讨论迁移到目标论坛
    ///
    /// # 参数
    /// - `discussion_id`: 讨论ID
    /// - `target_forum_id`: 目标论坛ID
    /// - `caller`: 操作人
    ///
    /// # 返回
    /// - `Ok(MoveReport)`: 迁移完成（可能附带非致命警告）
    /// - `Err(MoveError)`: 首个失败步骤的错误
    #[instrument(skip(self))]
    pub fn move_discussion(
        &self,
        discussion_id: i64,
        target_forum_id: i64,
        caller: i64,
    ) -> MoveResult<MoveReport> {
        tracing::info!("开始迁移讨论");

        // ===== 加载讨论与源论坛 =====
        let discussion = self
            .repos
            .forum_repo
            .find_discussion(discussion_id)?
            .ok_or(MoveError::DiscussionNotFound { discussion_id })?;
        let source_forum = self
            .repos
            .forum_repo
            .find_forum(discussion.forum_id)?
            .ok_or_else(|| RepositoryError::not_found("forumx", discussion.forum_id))?;

        // ===== 校验与授权（无改写） =====
        let target_forum = self.check_move_allowed(&discussion, &source_forum, target_forum_id, caller)?;
        tracing::info!(
            from_forum_id = source_forum.id,
            to_forum_id = target_forum.id,
            "迁移校验通过"
        );

        let mut warnings = Vec::new();

        // ===== 附件迁移 =====
        if !self
            .collaborators
            .attachments
            .relocate(&discussion, source_forum.id, target_forum.id)
        {
            tracing::warn!(discussion_id, "附件部分迁移失败，继续迁移");
            warnings.push(MoveWarning::AttachmentRelocationPartialFailure { discussion_id });
        }

        // ===== 订阅对账 =====
        let relocated = discussion.relocated_to(target_forum.id);
        let (considered, rewrite) = if target_forum.id == source_forum.id {
            // 同论坛迁移: 原样保留讨论级记录（含订阅时间）
            (0, self.retain_subscriptions(discussion_id)?)
        } else {
            let subscription_time = now_seconds();
            let (considered, plan) = self.plan_subscriptions(
                &discussion,
                &source_forum,
                &target_forum,
                subscription_time,
            )?;
            (considered, self.rewrite_subscriptions(&relocated, &plan)?)
        };
        tracing::info!(
            considered,
            unsubscribed = rewrite.unsubscribed,
            subscribed = rewrite.subscribed,
            dropped = rewrite.dropped,
            "订阅对账完成"
        );

        // ===== 事务落地 =====
        let summary = self.repos.relocation_repo.apply(&RelocationWrite {
            discussion_id,
            to_forum_id: target_forum.id,
            subscriptions: rewrite.rows,
        })?;
        for forum_id in [source_forum.id, target_forum.id] {
            if let Err(e) = self.cache.invalidate(forum_id) {
                tracing::warn!(forum_id, error = %e, "订阅缓存失效失败");
            }
        }
        tracing::info!(
            read_rows_moved = summary.read_rows_moved,
            subscriptions_deleted = summary.subscriptions_deleted,
            subscriptions_created = summary.subscriptions_created,
            "迁移已落地"
        );

        // ===== 审计 =====
        let event = DiscussionMovedEvent::new(
            &discussion,
            &source_forum,
            &target_forum,
            caller,
            now_seconds(),
        );
        // 事务已提交，审计失败只能作为警告返回
        let audit_event_id = match self.audit.emit(&event) {
            Ok(event_id) => Some(event_id),
            Err(e) => {
                tracing::error!(discussion_id, error = %e, "审计事件写入失败");
                warnings.push(MoveWarning::AuditRecordFailed {
                    message: e.to_string(),
                });
                None
            }
        };

        // ===== RSS 失效 =====
        for forum in [&source_forum, &target_forum] {
            if let Err(e) = self.collaborators.feeds.invalidate(forum) {
                tracing::warn!(forum_id = forum.id, error = %e, "RSS 缓存失效失败");
                warnings.push(MoveWarning::FeedInvalidationFailed {
                    forum_id: forum.id,
                    message: e.to_string(),
                });
            }
        }

        tracing::info!(warnings = warnings.len(), "讨论迁移完成");
        Ok(MoveReport {
            discussion: relocated,
            from_forum_id: source_forum.id,
            to_forum_id: target_forum.id,
            subscribers_considered: considered,
            unsubscribed: rewrite.unsubscribed,
            subscribed: rewrite.subscribed,
            subscriptions_dropped: rewrite.dropped,
            read_rows_moved: summary.read_rows_moved,
            audit_event_id,
            warnings,
        })
    }

    /// 收集授权事实并判定，通过时返回目标论坛
    fn check_move_allowed(
        &self,
        discussion: &Discussion,
        source_forum: &Forum,
        target_forum_id: i64,
        caller: i64,
    ) -> MoveResult<Forum> {
        let caps = &self.collaborators.capabilities;
        let target_forum = self.repos.forum_repo.find_forum(target_forum_id)?;

        let facts = match target_forum.as_ref() {
            None => MoveAuthorizationFacts {
                discussion,
                source_forum,
                target_forum_id,
                target_forum: None,
                target_module: None,
                can_move_in_source: false,
                can_view_hidden_in_target: false,
                can_start_in_target: false,
            },
            Some(target) => MoveAuthorizationFacts {
                discussion,
                source_forum,
                target_forum_id,
                target_forum: Some(target),
                target_module: self.repos.forum_repo.find_course_module(target.id)?,
                can_move_in_source: caps.has_capability(
                    Capability::MoveDiscussions,
                    source_forum.id,
                    caller,
                )?,
                can_view_hidden_in_target: caps.has_capability(
                    Capability::ViewHiddenActivities,
                    target.id,
                    caller,
                )?,
                can_start_in_target: caps.has_capability(
                    Capability::StartDiscussion,
                    target.id,
                    caller,
                )?,
            },
        };

        if let Err(e) = authorize(&facts) {
            tracing::warn!(error = %e, "迁移被拒绝");
            return Err(e);
        }
        target_forum.ok_or(MoveError::TargetNotFound {
            forum_id: target_forum_id,
        })
    }

    /// 计算源论坛潜在订阅者的对账动作
    fn plan_subscriptions(
        &self,
        discussion: &Discussion,
        source_forum: &Forum,
        target_forum: &Forum,
        as_of: NaiveDateTime,
    ) -> MoveResult<(usize, ReconciliationPlan)> {
        let users = self
            .collaborators
            .subscribers
            .subscribers_of(source_forum, discussion.group_scope)?;

        let loader = self.repos.subscription_repo.as_ref();
        self.cache.fill(target_forum.id, loader)?;
        self.cache.fill(source_forum.id, loader)?;

        let resolver = SubscriptionStateResolver::new(&self.cache);
        let mut inputs = Vec::with_capacity(users.len());
        for user_id in &users {
            let signals = SubscriptionSignals {
                forum_subscribed: resolver.is_subscribed(*user_id, source_forum, None)?,
                discussion_subscribed: resolver.is_subscribed(
                    *user_id,
                    source_forum,
                    Some(discussion.id),
                )?,
                target_subscribed: resolver.is_subscribed(*user_id, target_forum, None)?,
            };
            inputs.push((*user_id, signals));
        }

        Ok((users.len(), self.planner.plan_all(inputs, as_of)))
    }

    fn retain_subscriptions(&self, discussion_id: i64) -> MoveResult<SubscriptionRewrite> {
        let rows = self
            .repos
            .subscription_repo
            .find_discussion_subscriptions_by_discussion(discussion_id)?;
        Ok(SubscriptionRewrite {
            rows,
            unsubscribed: 0,
            subscribed: 0,
            dropped: 0,
        })
    }

    /// 将对账动作转为迁移后的讨论级订阅记录
    ///
    /// 强制订阅需用户在目标论坛有查看讨论权限，否则丢弃
    fn rewrite_subscriptions(
        &self,
        relocated: &Discussion,
        plan: &ReconciliationPlan,
    ) -> MoveResult<SubscriptionRewrite> {
        let mut rewrite = SubscriptionRewrite {
            rows: Vec::new(),
            unsubscribed: 0,
            subscribed: 0,
            dropped: 0,
        };

        for (user_id, action) in plan.changes() {
            let preference = match action {
                PlanAction::NoChange => continue,
                PlanAction::ForceUnsubscribeDiscussion => {
                    rewrite.unsubscribed += 1;
                    DiscussionPreference::Unsubscribed
                }
                PlanAction::ForceSubscribeDiscussion { as_of } => {
                    let can_view = self.collaborators.capabilities.has_capability(
                        Capability::ViewDiscussion,
                        relocated.forum_id,
                        user_id,
                    )?;
                    if !can_view {
                        tracing::info!(user_id, "目标论坛无查看权限，丢弃讨论订阅");
                        rewrite.dropped += 1;
                        continue;
                    }
                    rewrite.subscribed += 1;
                    DiscussionPreference::Subscribed { since: as_of }
                }
            };

            rewrite.rows.push(DiscussionSubscription {
                user_id,
                forum_id: relocated.forum_id,
                discussion_id: relocated.id,
                preference,
            });
        }

        Ok(rewrite)
    }
}

/// 当前时间（秒精度，与存储精度一致）
fn now_seconds() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
