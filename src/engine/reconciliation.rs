// ==========================================
// 论坛讨论迁移引擎 - 订阅对账规划器
// ==========================================
// 输入: 每个用户的三个订阅信号（源论坛/源讨论/目标论坛）
// 输出: 讨论级订阅的处理动作
// 规则:
//   (订阅, 退订讨论, 目标订阅)   -> 强制退订讨论
//   (未订阅, 订阅讨论, 目标未订阅) -> 强制订阅讨论
//   其余组合                      -> 不变
// 红线: 纯函数,每个用户的结果只依赖其自身三个信号
// ==========================================

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 单个用户的订阅信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionSignals {
    /// 源论坛（不含本讨论）
    pub forum_subscribed: bool,
    /// 源讨论
    pub discussion_subscribed: bool,
    /// 目标论坛（视为讨论已在其中）
    pub target_subscribed: bool,
}

/// 对账动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    NoChange,
    ForceUnsubscribeDiscussion,
    ForceSubscribeDiscussion { as_of: NaiveDateTime },
}

impl PlanAction {
    pub fn is_change(&self) -> bool {
        !matches!(self, PlanAction::NoChange)
    }
}

/// 对账结果（按用户ID有序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    actions: BTreeMap<i64, PlanAction>,
}

impl ReconciliationPlan {
    pub fn insert(&mut self, user_id: i64, action: PlanAction) {
        self.actions.insert(user_id, action);
    }

    pub fn action_for(&self, user_id: i64) -> Option<PlanAction> {
        self.actions.get(&user_id).copied()
    }

    /// 需要落地的变更（跳过 NoChange）
    pub fn changes(&self) -> impl Iterator<Item = (i64, PlanAction)> + '_ {
        self.actions
            .iter()
            .filter(|(_, action)| action.is_change())
            .map(|(user_id, action)| (*user_id, *action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn count_unsubscribe(&self) -> usize {
        self.actions
            .values()
            .filter(|a| matches!(a, PlanAction::ForceUnsubscribeDiscussion))
            .count()
    }

    pub fn count_subscribe(&self) -> usize {
        self.actions
            .values()
            .filter(|a| matches!(a, PlanAction::ForceSubscribeDiscussion { .. }))
            .count()
    }
}

/// ReconciliationPlanner - 订阅对账规划器
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationPlanner;

impl ReconciliationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// 单个用户的对账动作
    pub fn plan(&self, signals: SubscriptionSignals, as_of: NaiveDateTime) -> PlanAction {
        match (
            signals.forum_subscribed,
            signals.discussion_subscribed,
            signals.target_subscribed,
        ) {
            // 订阅论坛但退订了本讨论; 目标论坛同样订阅时会重新收到通知
            (true, false, true) => PlanAction::ForceUnsubscribeDiscussion,
            // 未订阅论坛但订阅了本讨论; 目标论坛同样未订阅时会静默丢失
            (false, true, false) => PlanAction::ForceSubscribeDiscussion { as_of },
            _ => PlanAction::NoChange,
        }
    }

    /// 批量规划，所有订阅动作共享同一 as_of
    pub fn plan_all<I>(&self, inputs: I, as_of: NaiveDateTime) -> ReconciliationPlan
    where
        I: IntoIterator<Item = (i64, SubscriptionSignals)>,
    {
        let mut plan = ReconciliationPlan::default();
        for (user_id, signals) in inputs {
            let action = self.plan(signals, as_of);
            tracing::debug!(user_id, ?signals, ?action, "订阅对账");
            plan.insert(user_id, action);
        }
        plan
    }
}
