// ==========================================
// 论坛讨论迁移引擎 - 潜在订阅者枚举
// ==========================================
// 范围: 源论坛在讨论分组范围内的潜在订阅者
//   强制订阅模式: 全部课程成员
//   其他模式:     显式订阅论坛的课程成员
//   另加:         在本论坛持有任意讨论级记录的课程成员
// 输出: 去重并按用户ID升序
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{Forum, GroupScope, SubscriptionMode};
use crate::engine::ports::{CollaboratorResult, SubscriberEnumerator};
use crate::repository::{EnrolmentRepository, SubscriptionRepository};

/// 基于仓储的订阅者枚举
pub struct RepositorySubscriberEnumerator {
    enrolment_repo: Arc<EnrolmentRepository>,
    subscription_repo: Arc<SubscriptionRepository>,
}

impl RepositorySubscriberEnumerator {
    pub fn new(
        enrolment_repo: Arc<EnrolmentRepository>,
        subscription_repo: Arc<SubscriptionRepository>,
    ) -> Self {
        Self {
            enrolment_repo,
            subscription_repo,
        }
    }
}

impl SubscriberEnumerator for RepositorySubscriberEnumerator {
    fn subscribers_of(&self, forum: &Forum, group_scope: GroupScope) -> CollaboratorResult<Vec<i64>> {
        let group_id = group_scope.group_filter();

        let mut users: BTreeSet<i64> = match forum.subscription_mode {
            SubscriptionMode::Forced => self
                .enrolment_repo
                .list_enrolled(forum.course_id, group_id)?
                .into_iter()
                .collect(),
            _ => self
                .subscription_repo
                .list_forum_subscribers(forum.id, forum.course_id, group_id)?
                .into_iter()
                .collect(),
        };
        users.extend(
            self.subscription_repo
                .list_discussion_subscribers(forum.id, forum.course_id, group_id)?,
        );

        tracing::debug!(
            forum_id = forum.id,
            mode = %forum.subscription_mode,
            ?group_id,
            count = users.len(),
            "潜在订阅者已枚举"
        );
        Ok(users.into_iter().collect())
    }
}
