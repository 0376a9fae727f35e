// ==========================================
// 论坛讨论迁移引擎 - 引擎层依赖聚合
// ==========================================
// 职责: 聚合迁移执行器所需的 Repository 与外部协作方
// ==========================================

use std::sync::Arc;

use crate::engine::ports::{AttachmentRelocator, CapabilityChecker, FeedInvalidator, SubscriberEnumerator};
use crate::repository::{DiscussionRelocationRepository, ForumRepository, SubscriptionRepository};

/// 迁移执行器仓储集合
///
/// # 包含的仓储
/// - `forum_repo`: 论坛/讨论/课程模块读取
/// - `subscription_repo`: 订阅缓存数据源
/// - `relocation_repo`: 事务内落地迁移
#[derive(Clone)]
pub struct RelocationRepositories {
    pub forum_repo: Arc<ForumRepository>,
    pub subscription_repo: Arc<SubscriptionRepository>,
    pub relocation_repo: Arc<DiscussionRelocationRepository>,
}

impl RelocationRepositories {
    pub fn new(
        forum_repo: Arc<ForumRepository>,
        subscription_repo: Arc<SubscriptionRepository>,
        relocation_repo: Arc<DiscussionRelocationRepository>,
    ) -> Self {
        Self {
            forum_repo,
            subscription_repo,
            relocation_repo,
        }
    }
}

/// 迁移执行器外部协作方集合
#[derive(Clone)]
pub struct RelocationCollaborators {
    pub capabilities: Arc<dyn CapabilityChecker>,
    pub attachments: Arc<dyn AttachmentRelocator>,
    pub subscribers: Arc<dyn SubscriberEnumerator>,
    pub feeds: Arc<dyn FeedInvalidator>,
}

impl RelocationCollaborators {
    pub fn new(
        capabilities: Arc<dyn CapabilityChecker>,
        attachments: Arc<dyn AttachmentRelocator>,
        subscribers: Arc<dyn SubscriberEnumerator>,
        feeds: Arc<dyn FeedInvalidator>,
    ) -> Self {
        Self {
            capabilities,
            attachments,
            subscribers,
            feeds,
        }
    }
}
