// ==========================================
// 论坛讨论迁移引擎 - 领域类型定义
// ==========================================
// 职责: 论坛类型、订阅模式、分组范围、讨论级订阅偏好、权限
// 红线: 全部为封闭枚举,不允许自由字符串参与判断
// ==========================================

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 论坛类型 (Forum Type)
// ==========================================
// 存储格式: 小写字符串 (与 forumx.type 列一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumType {
    General,  // 普通论坛
    Single,   // 单讨论论坛
    News,     // 公告论坛
    QandA,    // 问答论坛
    EachUser, // 每人一帖
    Blog,     // 博客式论坛
}

impl ForumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForumType::General => "general",
            ForumType::Single => "single",
            ForumType::News => "news",
            ForumType::QandA => "qanda",
            ForumType::EachUser => "eachuser",
            ForumType::Blog => "blog",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "general" => Some(ForumType::General),
            "single" => Some(ForumType::Single),
            "news" => Some(ForumType::News),
            "qanda" => Some(ForumType::QandA),
            "eachuser" => Some(ForumType::EachUser),
            "blog" => Some(ForumType::Blog),
            _ => None,
        }
    }

    /// 单讨论论坛不允许迁入/迁出讨论
    pub fn supports_discussion_move(&self) -> bool {
        !matches!(self, ForumType::Single)
    }
}

impl fmt::Display for ForumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 默认订阅模式 (Subscription Mode)
// ==========================================
// 存储格式: 整数 (forumx.forcesubscribe 列)
// 0=可选 1=强制 2=自动 3=禁止
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionMode {
    Optional,
    Forced,
    Automatic,
    Disabled,
}

impl SubscriptionMode {
    pub fn code(&self) -> i64 {
        match self {
            SubscriptionMode::Optional => 0,
            SubscriptionMode::Forced => 1,
            SubscriptionMode::Automatic => 2,
            SubscriptionMode::Disabled => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SubscriptionMode::Optional),
            1 => Some(SubscriptionMode::Forced),
            2 => Some(SubscriptionMode::Automatic),
            3 => Some(SubscriptionMode::Disabled),
            _ => None,
        }
    }

    /// 无显式记录时的默认订阅状态
    ///
    /// # 参数
    /// - `enrolment_default`: 调用方提供的选课派生默认值（仅对可选/自动模式生效）
    pub fn default_subscribed(&self, enrolment_default: Option<bool>) -> bool {
        match self {
            SubscriptionMode::Forced => true,
            SubscriptionMode::Disabled => false,
            SubscriptionMode::Optional | SubscriptionMode::Automatic => {
                enrolment_default.unwrap_or(false)
            }
        }
    }
}

impl fmt::Display for SubscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionMode::Optional => write!(f, "OPTIONAL"),
            SubscriptionMode::Forced => write!(f, "FORCED"),
            SubscriptionMode::Automatic => write!(f, "AUTOMATIC"),
            SubscriptionMode::Disabled => write!(f, "DISABLED"),
        }
    }
}

// ==========================================
// 分组范围 (Group Scope)
// ==========================================
// 存储格式: forumx_discussions.groupid, -1 表示全部分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupScope {
    AllGroups,
    Group(i64),
}

impl GroupScope {
    pub const ALL_GROUPS_SENTINEL: i64 = -1;

    pub fn from_stored(groupid: i64) -> Self {
        if groupid == Self::ALL_GROUPS_SENTINEL {
            GroupScope::AllGroups
        } else {
            GroupScope::Group(groupid)
        }
    }

    pub fn to_stored(&self) -> i64 {
        match self {
            GroupScope::AllGroups => Self::ALL_GROUPS_SENTINEL,
            GroupScope::Group(id) => *id,
        }
    }

    /// 订阅者枚举时的分组过滤条件（None 表示不过滤）
    pub fn group_filter(&self) -> Option<i64> {
        match self {
            GroupScope::AllGroups => None,
            GroupScope::Group(0) => None,
            GroupScope::Group(id) => Some(*id),
        }
    }
}

// ==========================================
// 讨论级订阅偏好 (Discussion Preference)
// ==========================================
// 存储格式: forumx_discussion_subs.preference
// -1 = 显式退订; 其他值 = 订阅起始时间 (unix 秒)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscussionPreference {
    Subscribed { since: NaiveDateTime },
    Unsubscribed,
}

impl DiscussionPreference {
    pub const UNSUBSCRIBED_SENTINEL: i64 = -1;

    pub fn is_subscribed(&self) -> bool {
        matches!(self, DiscussionPreference::Subscribed { .. })
    }

    pub fn to_stored(&self) -> i64 {
        match self {
            DiscussionPreference::Subscribed { since } => since.and_utc().timestamp(),
            DiscussionPreference::Unsubscribed => Self::UNSUBSCRIBED_SENTINEL,
        }
    }

    /// 解析存储值；时间戳越界时返回 None
    pub fn from_stored(preference: i64) -> Option<Self> {
        if preference == Self::UNSUBSCRIBED_SENTINEL {
            return Some(DiscussionPreference::Unsubscribed);
        }
        DateTime::from_timestamp(preference, 0).map(|dt| DiscussionPreference::Subscribed {
            since: dt.naive_utc(),
        })
    }
}

// ==========================================
// 权限 (Capability)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    MoveDiscussions,
    StartDiscussion,
    ViewDiscussion,
    ViewHiddenActivities,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::MoveDiscussions => "mod/forumx:movediscussions",
            Capability::StartDiscussion => "mod/forumx:startdiscussion",
            Capability::ViewDiscussion => "mod/forumx:viewdiscussion",
            Capability::ViewHiddenActivities => "moodle/course:viewhiddenactivities",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "mod/forumx:movediscussions" => Some(Capability::MoveDiscussions),
            "mod/forumx:startdiscussion" => Some(Capability::StartDiscussion),
            "mod/forumx:viewdiscussion" => Some(Capability::ViewDiscussion),
            "moodle/course:viewhiddenactivities" => Some(Capability::ViewHiddenActivities),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_forum_type_parse_and_guard() {
        assert_eq!(ForumType::parse("single"), Some(ForumType::Single));
        assert_eq!(ForumType::parse(" NEWS "), Some(ForumType::News));
        assert_eq!(ForumType::parse("wiki"), None);
        assert!(!ForumType::Single.supports_discussion_move());
        assert!(ForumType::General.supports_discussion_move());
        assert!(ForumType::News.supports_discussion_move());
    }

    #[test]
    fn test_subscription_mode_defaults() {
        assert!(SubscriptionMode::Forced.default_subscribed(None));
        assert!(SubscriptionMode::Forced.default_subscribed(Some(false)));
        assert!(!SubscriptionMode::Disabled.default_subscribed(Some(true)));
        assert!(!SubscriptionMode::Optional.default_subscribed(None));
        assert!(SubscriptionMode::Automatic.default_subscribed(Some(true)));
        assert_eq!(SubscriptionMode::from_code(2), Some(SubscriptionMode::Automatic));
        assert_eq!(SubscriptionMode::from_code(9), None);
    }

    #[test]
    fn test_group_scope_sentinel() {
        assert_eq!(GroupScope::from_stored(-1), GroupScope::AllGroups);
        assert_eq!(GroupScope::from_stored(7), GroupScope::Group(7));
        assert_eq!(GroupScope::AllGroups.to_stored(), -1);
        assert_eq!(GroupScope::AllGroups.group_filter(), None);
        assert_eq!(GroupScope::Group(0).group_filter(), None);
        assert_eq!(GroupScope::Group(7).group_filter(), Some(7));
    }

    #[test]
    fn test_discussion_preference_storage() {
        let since = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let pref = DiscussionPreference::Subscribed { since };
        let stored = pref.to_stored();
        assert_eq!(DiscussionPreference::from_stored(stored), Some(pref));
        assert_eq!(
            DiscussionPreference::from_stored(-1),
            Some(DiscussionPreference::Unsubscribed)
        );
        assert!(!DiscussionPreference::Unsubscribed.is_subscribed());
    }
}
