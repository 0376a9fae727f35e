// ==========================================
// 论坛讨论迁移引擎 - 论坛/讨论领域模型
// ==========================================
// 对齐: forumx / forumx_discussions / course_modules 表
// 红线: 迁移不修改原值,迁移后的讨论为新构造的值
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::{ForumType, GroupScope, SubscriptionMode};

// ==========================================
// Forum - 论坛
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub forum_type: ForumType,
    pub subscription_mode: SubscriptionMode,
}

// ==========================================
// Discussion - 讨论
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: i64,
    pub course_id: i64,
    pub forum_id: i64,
    pub name: String,
    pub group_scope: GroupScope,
    pub first_post_id: i64,
}

impl Discussion {
    /// 构造迁移到目标论坛后的讨论
    pub fn relocated_to(&self, forum_id: i64) -> Discussion {
        Discussion {
            forum_id,
            ..self.clone()
        }
    }
}

// ==========================================
// CourseModule - 课程模块 (论坛实例)
// ==========================================
// 用途: 目标论坛可见性校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    pub course_id: i64,
    pub forum_id: i64,
    pub visible: bool,
}
