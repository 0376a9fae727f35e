// ==========================================
// 论坛讨论迁移引擎 - 审计事件领域模型
// ==========================================
// 红线: 所有迁移必须记录
// 对齐: audit_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditEvent - 审计事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    // ===== 主键 =====
    pub event_id: String,         // UUID v4
    pub event_type: String,       // 事件类型 (存储为字符串)
    pub object_id: i64,           // 事件对象 (讨论ID)
    pub context_forum_id: i64,    // 事件上下文 (目标论坛)
    pub actor: i64,               // 操作人
    pub created_at: NaiveDateTime,

    // ===== 事件负载 =====
    pub other_json: JsonValue,     // 附加参数 (fromforumid/toforumid)
    pub snapshots_json: JsonValue, // 迁移前记录快照
}

// ==========================================
// AuditEventType - 事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    DiscussionMoved,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::DiscussionMoved => "discussion_moved",
        }
    }
}
