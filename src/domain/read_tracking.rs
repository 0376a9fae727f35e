// ==========================================
// 论坛讨论迁移引擎 - 阅读跟踪领域模型
// ==========================================
// 对齐: forumx_read 表
// 红线: forum_id 必须始终等于所属讨论的 forum_id
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRecord {
    pub user_id: i64,
    pub forum_id: i64,
    pub discussion_id: i64,
    pub post_id: i64,
    pub first_read: NaiveDateTime,
    pub last_read: NaiveDateTime,
}
