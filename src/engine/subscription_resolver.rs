// ==========================================
// 论坛讨论迁移引擎 - 订阅状态解析器
// ==========================================
// 优先级: 讨论级记录 -> 论坛级记录 -> 论坛默认订阅模式
// 红线: 只读预填充缓存,无副作用,单次对账内结果稳定
// ==========================================

use crate::domain::Forum;
use crate::engine::subscription_cache::{SubscriptionCache, SubscriptionCacheError};

/// SubscriptionStateResolver - 有效订阅状态解析器
pub struct SubscriptionStateResolver<'a> {
    cache: &'a SubscriptionCache,
}

impl<'a> SubscriptionStateResolver<'a> {
    pub fn new(cache: &'a SubscriptionCache) -> Self {
        Self { cache }
    }

    /// 用户在论坛（可选讨论）上的有效订阅状态
    pub fn is_subscribed(
        &self,
        user_id: i64,
        forum: &Forum,
        discussion_id: Option<i64>,
    ) -> Result<bool, SubscriptionCacheError> {
        self.is_subscribed_with_default(user_id, forum, discussion_id, None)
    }

    /// 同 `is_subscribed`，附带调用方提供的选课派生默认值
    ///
    /// # 参数
    /// - `enrolment_default`: 仅在可选/自动模式且无任何显式记录时生效
    pub fn is_subscribed_with_default(
        &self,
        user_id: i64,
        forum: &Forum,
        discussion_id: Option<i64>,
        enrolment_default: Option<bool>,
    ) -> Result<bool, SubscriptionCacheError> {
        // 1) 讨论级显式记录
        if let Some(discussion_id) = discussion_id {
            if let Some(preference) =
                self.cache
                    .discussion_preference(forum.id, discussion_id, user_id)?
            {
                return Ok(preference.is_subscribed());
            }
        }

        // 2) 论坛级显式记录
        if let Some(subscribed) = self.cache.forum_preference(forum.id, user_id)? {
            return Ok(subscribed);
        }

        // 3) 论坛默认订阅模式
        Ok(forum.subscription_mode.default_subscribed(enrolment_default))
    }
}
