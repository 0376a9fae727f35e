// ==========================================
// 论坛讨论迁移引擎 - 订阅领域模型
// ==========================================
// 对齐: forumx_subscriptions / forumx_discussion_subs 表
// 说明: 不存在记录 = 继承论坛默认订阅模式
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::DiscussionPreference;

/// 论坛级订阅记录（显式订阅/退订）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumSubscription {
    pub user_id: i64,
    pub forum_id: i64,
    pub subscribed: bool,
}

/// 讨论级订阅记录，比论坛级记录更具体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionSubscription {
    pub user_id: i64,
    pub forum_id: i64,
    pub discussion_id: i64,
    pub preference: DiscussionPreference,
}
