// ==========================================
// 论坛讨论迁移引擎 - 迁移授权判定
// ==========================================
// 输入: 已收集的事实（论坛/模块/权限检查结果）
// 输出: 通过 或 首个失败原因
// 顺序: 目标存在 -> 源论坛迁移权限 -> 论坛类型 -> 目标可见性 -> 目标发帖权限
// 红线: 纯函数,不访问存储,不产生副作用
// ==========================================

use crate::domain::{Capability, CourseModule, Discussion, Forum};
use crate::engine::relocation::{MoveEndpoint, MoveError};

/// 授权判定所需事实
#[derive(Debug, Clone)]
pub struct MoveAuthorizationFacts<'a> {
    pub discussion: &'a Discussion,
    pub source_forum: &'a Forum,
    pub target_forum_id: i64,
    pub target_forum: Option<&'a Forum>,
    /// 目标论坛的课程模块
    pub target_module: Option<CourseModule>,
    pub can_move_in_source: bool,
    pub can_view_hidden_in_target: bool,
    pub can_start_in_target: bool,
}

/// 判定迁移是否允许
pub fn authorize(facts: &MoveAuthorizationFacts<'_>) -> Result<(), MoveError> {
    let Some(target_forum) = facts.target_forum else {
        return Err(MoveError::TargetNotFound {
            forum_id: facts.target_forum_id,
        });
    };

    if !facts.can_move_in_source {
        return Err(MoveError::Forbidden {
            capability: Capability::MoveDiscussions,
            forum_id: facts.source_forum.id,
        });
    }

    if !facts.source_forum.forum_type.supports_discussion_move() {
        return Err(MoveError::UnsupportedForumType {
            forum_id: facts.source_forum.id,
            endpoint: MoveEndpoint::Source,
        });
    }
    if !target_forum.forum_type.supports_discussion_move() {
        return Err(MoveError::UnsupportedForumType {
            forum_id: target_forum.id,
            endpoint: MoveEndpoint::Target,
        });
    }

    // 目标模块必须属于讨论所在课程
    let module = match &facts.target_module {
        Some(module) if module.course_id == facts.discussion.course_id => module,
        _ => {
            return Err(MoveError::TargetNotFound {
                forum_id: target_forum.id,
            })
        }
    };
    if !module.visible && !facts.can_view_hidden_in_target {
        return Err(MoveError::TargetNotVisible {
            forum_id: target_forum.id,
        });
    }

    if !facts.can_start_in_target {
        return Err(MoveError::Forbidden {
            capability: Capability::StartDiscussion,
            forum_id: target_forum.id,
        });
    }

    Ok(())
}
