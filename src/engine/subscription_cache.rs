// ==========================================
// 论坛讨论迁移引擎 - 订阅缓存服务
// ==========================================
// 职责: 按论坛缓存论坛级/讨论级订阅记录
// 红线: 无全局静态状态,由调用方显式持有并传入
// 红线: 未填充的论坛查询直接报错,不回落到存储
// ==========================================

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::domain::{DiscussionPreference, DiscussionSubscription, ForumSubscription};
use crate::engine::ports::{CollaboratorError, SubscriptionLoader};

/// 订阅缓存错误
#[derive(Error, Debug)]
pub enum SubscriptionCacheError {
    #[error("订阅缓存未填充: forum_id={forum_id}")]
    NotFilled { forum_id: i64 },

    #[error("订阅缓存锁异常: {0}")]
    Poisoned(String),

    #[error("订阅缓存加载失败: forum_id={forum_id}, {message}")]
    LoadFailed { forum_id: i64, message: String },
}

/// 单个论坛的订阅快照
#[derive(Debug, Clone, Default)]
struct ForumEntry {
    /// user_id -> 显式论坛级订阅
    forum: HashMap<i64, bool>,
    /// discussion_id -> (user_id -> 讨论级偏好)
    discussions: HashMap<i64, HashMap<i64, DiscussionPreference>>,
}

/// 订阅缓存
#[derive(Debug, Default)]
pub struct SubscriptionCache {
    entries: RwLock<HashMap<i64, ForumEntry>>,
}

impl SubscriptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从数据源填充论坛的订阅记录（覆盖旧条目）
    pub fn fill(&self, forum_id: i64, loader: &dyn SubscriptionLoader) -> Result<(), SubscriptionCacheError> {
        let load_failed = |e: CollaboratorError| SubscriptionCacheError::LoadFailed {
            forum_id,
            message: e.to_string(),
        };
        let forum_rows = loader.load_forum_subscriptions(forum_id).map_err(load_failed)?;
        let discussion_rows = loader
            .load_discussion_subscriptions(forum_id)
            .map_err(load_failed)?;

        tracing::debug!(
            forum_id,
            forum_rows = forum_rows.len(),
            discussion_rows = discussion_rows.len(),
            "订阅缓存已填充"
        );
        self.seed(forum_id, forum_rows, discussion_rows)
    }

    /// 以内存记录填充论坛条目
    pub fn seed(
        &self,
        forum_id: i64,
        forum_rows: Vec<ForumSubscription>,
        discussion_rows: Vec<DiscussionSubscription>,
    ) -> Result<(), SubscriptionCacheError> {
        let mut entry = ForumEntry::default();
        for row in forum_rows.into_iter().filter(|r| r.forum_id == forum_id) {
            entry.forum.insert(row.user_id, row.subscribed);
        }
        for row in discussion_rows.into_iter().filter(|r| r.forum_id == forum_id) {
            entry
                .discussions
                .entry(row.discussion_id)
                .or_default()
                .insert(row.user_id, row.preference);
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| SubscriptionCacheError::Poisoned(e.to_string()))?;
        entries.insert(forum_id, entry);
        Ok(())
    }

    pub fn invalidate(&self, forum_id: i64) -> Result<(), SubscriptionCacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| SubscriptionCacheError::Poisoned(e.to_string()))?;
        entries.remove(&forum_id);
        Ok(())
    }

    pub fn is_filled(&self, forum_id: i64) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(&forum_id))
            .unwrap_or(false)
    }

    /// 显式论坛级订阅（None 表示无记录）
    pub fn forum_preference(&self, forum_id: i64, user_id: i64) -> Result<Option<bool>, SubscriptionCacheError> {
        self.with_entry(forum_id, |entry| entry.forum.get(&user_id).copied())
    }

    /// 显式讨论级订阅（None 表示无记录）
    pub fn discussion_preference(
        &self,
        forum_id: i64,
        discussion_id: i64,
        user_id: i64,
    ) -> Result<Option<DiscussionPreference>, SubscriptionCacheError> {
        self.with_entry(forum_id, |entry| {
            entry
                .discussions
                .get(&discussion_id)
                .and_then(|users| users.get(&user_id))
                .copied()
        })
    }

    fn with_entry<T>(
        &self,
        forum_id: i64,
        f: impl FnOnce(&ForumEntry) -> T,
    ) -> Result<T, SubscriptionCacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| SubscriptionCacheError::Poisoned(e.to_string()))?;
        entries
            .get(&forum_id)
            .map(f)
            .ok_or(SubscriptionCacheError::NotFilled { forum_id })
    }
}
