// ==========================================
// 讨论迁移端到端测试
// ==========================================
// 覆盖: DiscussionApi -> MoveTransactionExecutor -> Repository 全链路
// ==========================================


use forumx_relocation::config::{config_keys, ConfigManager};
use forumx_relocation::domain::{
    Capability, DiscussionPreference, ForumType, GroupScope, SubscriptionMode,
};
use forumx_relocation::{logging, ApiError};
use test_helpers::*;

fn since() -> DiscussionPreference {
    DiscussionPreference::Subscribed {
        since: fixed_time(1_700_000_000),
    }
}

// ==========================================
// 订阅对账
// ==========================================

#[test]
fn test_move_preserves_opt_out_and_opt_in() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);

    // 用户1: 两个论坛都订阅，但退订了该讨论
    subscribe_forum(&state, 1, SOURCE_FORUM);
    subscribe_forum(&state, 1, TARGET_FORUM);
    set_discussion_preference(&state, 1, SOURCE_FORUM, DISCUSSION, DiscussionPreference::Unsubscribed);
    // 用户2: 都未订阅，但单独订阅了该讨论
    set_discussion_preference(&state, 2, SOURCE_FORUM, DISCUSSION, since());
    // 用户3: 订阅源论坛与目标论坛，无讨论记录
    subscribe_forum(&state, 3, SOURCE_FORUM);
    subscribe_forum(&state, 3, TARGET_FORUM);

    let before: Vec<bool> = (1..=3).map(|u| effective_status(&state, u, DISCUSSION)).collect();
    assert_eq!(before, vec![false, true, true]);

    let response = move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();
    assert_eq!(response.forum_id, TARGET_FORUM);
    assert_eq!(response.report.unsubscribed, 1);
    assert_eq!(response.report.subscribed, 1);
    assert!(response.warnings.is_empty());

    assert_eq!(discussion_forum(&state, DISCUSSION), TARGET_FORUM);
    let after: Vec<bool> = (1..=3).map(|u| effective_status(&state, u, DISCUSSION)).collect();
    assert_eq!(before, after);

    // 所有讨论级记录都已改写到目标论坛
    let rows = state
        .subscription_repo
        .find_discussion_subscriptions_by_discussion(DISCUSSION)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.forum_id == TARGET_FORUM));
}

#[test]
fn test_round_trip_restores_forum_level_users() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);

    // (T,F,T) 退订
    subscribe_forum(&state, 1, SOURCE_FORUM);
    subscribe_forum(&state, 1, TARGET_FORUM);
    set_discussion_preference(&state, 1, SOURCE_FORUM, DISCUSSION, DiscussionPreference::Unsubscribed);
    // (F,T,F) 单独订阅
    set_discussion_preference(&state, 2, SOURCE_FORUM, DISCUSSION, since());
    // 仅源论坛订阅
    subscribe_forum(&state, 3, SOURCE_FORUM);
    // 两边都订阅
    subscribe_forum(&state, 4, SOURCE_FORUM);
    subscribe_forum(&state, 4, TARGET_FORUM);

    let users = [1, 2, 3, 4, 5];
    let original: Vec<bool> = users.iter().map(|&u| effective_status(&state, u, DISCUSSION)).collect();

    move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();
    move_with_token(&state, DISCUSSION, SOURCE_FORUM, CALLER).unwrap();

    assert_eq!(discussion_forum(&state, DISCUSSION), SOURCE_FORUM);
    let restored: Vec<bool> = users.iter().map(|&u| effective_status(&state, u, DISCUSSION)).collect();
    assert_eq!(original, restored);
}

#[test]
fn test_subscription_dropped_without_view_capability() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);

    set_discussion_preference(&state, 2, SOURCE_FORUM, DISCUSSION, since());
    state
        .capability_repo
        .revoke(2, TARGET_FORUM, Capability::ViewDiscussion)
        .unwrap();

    let response = move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();
    assert_eq!(response.report.subscribed, 0);
    assert_eq!(response.report.subscriptions_dropped, 1);

    assert!(!effective_status(&state, 2, DISCUSSION));
    assert!(state
        .subscription_repo
        .find_discussion_subscriptions_by_discussion(DISCUSSION)
        .unwrap()
        .is_empty());
}

#[test]
fn test_group_scope_limits_reconciled_users() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    add_discussion(&state, 11, SOURCE_FORUM, GroupScope::Group(5));
    state.enrolment_repo.add_group_member(5, 1).unwrap();

    for user in [1, 2] {
        subscribe_forum(&state, user, SOURCE_FORUM);
        subscribe_forum(&state, user, TARGET_FORUM);
        set_discussion_preference(&state, user, SOURCE_FORUM, 11, DiscussionPreference::Unsubscribed);
    }

    let response = move_with_token(&state, 11, TARGET_FORUM, CALLER).unwrap();
    assert_eq!(response.report.subscribers_considered, 1);

    let rows = state
        .subscription_repo
        .find_discussion_subscriptions_by_discussion(11)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, 1);
    assert_eq!(rows[0].preference, DiscussionPreference::Unsubscribed);
}

#[test]
fn test_forced_target_drops_redundant_rows() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    add_forum(&state, 400, ForumType::General, SubscriptionMode::Forced);

    // 用户1 在源论坛单独订阅了讨论；目标论坛强制订阅，无需保留讨论记录
    set_discussion_preference(&state, 1, SOURCE_FORUM, DISCUSSION, since());
    for cap in [Capability::MoveDiscussions, Capability::StartDiscussion] {
        state.capability_repo.grant(CALLER, 400, cap).unwrap();
    }

    let response = move_with_token(&state, DISCUSSION, 400, CALLER).unwrap();
    assert_eq!(response.report.subscribed, 0);
    assert!(effective_status(&state, 1, DISCUSSION));
}

// ==========================================
// 位置一致性
// ==========================================

#[test]
fn test_read_records_follow_discussion() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    add_read_record(&state, 1, SOURCE_FORUM, DISCUSSION);
    add_read_record(&state, 2, SOURCE_FORUM, DISCUSSION);

    let response = move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();
    assert_eq!(response.report.read_rows_moved, 2);

    let records = state.read_tracking_repo.find_by_discussion(DISCUSSION).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.forum_id == TARGET_FORUM));
    assert_eq!(records[0].first_read, fixed_time(1_700_000_000));
}

#[test]
fn test_rejected_move_leaves_store_untouched() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    add_read_record(&state, 1, SOURCE_FORUM, DISCUSSION);
    subscribe_forum(&state, 1, SOURCE_FORUM);
    set_discussion_preference(&state, 1, SOURCE_FORUM, DISCUSSION, DiscussionPreference::Unsubscribed);

    let err = move_with_token(&state, DISCUSSION, SINGLE_FORUM, CALLER).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    let err = move_with_token(&state, DISCUSSION, 999, CALLER).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = move_with_token(&state, DISCUSSION, TARGET_FORUM, 1).unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    assert_eq!(discussion_forum(&state, DISCUSSION), SOURCE_FORUM);
    let records = state.read_tracking_repo.find_by_discussion(DISCUSSION).unwrap();
    assert!(records.iter().all(|r| r.forum_id == SOURCE_FORUM));
    let rows = state
        .subscription_repo
        .find_discussion_subscriptions_by_discussion(DISCUSSION)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].forum_id, SOURCE_FORUM);
    assert!(state
        .audit_log_repo
        .find_by_object("discussion_moved", DISCUSSION)
        .unwrap()
        .is_empty());
}

#[test]
fn test_move_out_of_single_forum_rejected() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    add_discussion(&state, 12, SINGLE_FORUM, GroupScope::AllGroups);

    let err = move_with_token(&state, 12, TARGET_FORUM, CALLER).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(discussion_forum(&state, 12), SINGLE_FORUM);
}

// ==========================================
// 会话令牌与响应
// ==========================================

#[test]
fn test_session_token_required_and_single_use() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);
    let api = &state.discussion_api;

    let err = api
        .move_discussion(DISCUSSION, TARGET_FORUM, CALLER, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidSessionToken(_)));
    assert_eq!(discussion_forum(&state, DISCUSSION), SOURCE_FORUM);

    let token = api.issue_session_token(CALLER).unwrap();
    let response = api
        .move_discussion(DISCUSSION, TARGET_FORUM, CALLER, Some(&token))
        .unwrap();
    assert_eq!(response.redirect_url, "/mod/forumx/discuss.php?d=10&move=-1");
    assert!(response.notice.contains("论坛200"));

    // 令牌不可重放
    let err = api
        .move_discussion(DISCUSSION, SOURCE_FORUM, CALLER, Some(&token))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidSessionToken(_)));
    assert_eq!(discussion_forum(&state, DISCUSSION), TARGET_FORUM);
}

#[test]
fn test_session_token_optional_when_disabled() {
    let (_temp, db_path) = create_test_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::SESSION_TOKEN_REQUIRED, "0")
        .unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);

    state
        .discussion_api
        .move_discussion(DISCUSSION, TARGET_FORUM, CALLER, None)
        .unwrap();
    assert_eq!(discussion_forum(&state, DISCUSSION), TARGET_FORUM);
}

#[test]
fn test_audit_event_recorded() {
    let (_temp, db_path) = create_test_db().unwrap();
    let state = create_app_state(&db_path);
    seed_course(&state);

    let response = move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();

    let event = state
        .audit_log_repo
        .find_by_id(response.report.audit_event_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(event.object_id, DISCUSSION);
    assert_eq!(event.context_forum_id, TARGET_FORUM);
    assert_eq!(event.actor, CALLER);
    assert_eq!(event.other_json["fromforumid"], SOURCE_FORUM);
    assert_eq!(event.other_json["toforumid"], TARGET_FORUM);
}

// ==========================================
// 外部协作方（RSS / 附件）
// ==========================================

#[test]
fn test_rss_feeds_invalidated_for_both_forums() {
    let (_temp, db_path) = create_test_db().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();
    config
        .set_global_config_value(config_keys::ENABLE_RSS_FEEDS, "1")
        .unwrap();
    config
        .set_global_config_value(
            config_keys::RSS_CACHE_DIR,
            cache_dir.path().to_str().unwrap(),
        )
        .unwrap();

    let feed_dir = cache_dir.path().join("rss").join("mod_forumx");
    std::fs::create_dir_all(&feed_dir).unwrap();
    for name in ["100_a.xml", "200_b.xml", "300_c.xml"] {
        std::fs::write(feed_dir.join(name), "<rss/>").unwrap();
    }

    let state = create_app_state(&db_path);
    seed_course(&state);
    move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();

    assert!(!feed_dir.join("100_a.xml").exists());
    assert!(!feed_dir.join("200_b.xml").exists());
    assert!(feed_dir.join("300_c.xml").exists());
}

#[test]
fn test_attachments_follow_discussion() {
    let (_temp, db_path) = create_test_db().unwrap();
    let data_root = tempfile::tempdir().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(
            config_keys::ATTACHMENT_DATA_ROOT,
            data_root.path().to_str().unwrap(),
        )
        .unwrap();

    let source_dir = data_root
        .path()
        .join(COURSE_ID.to_string())
        .join("forumdata")
        .join(SOURCE_FORUM.to_string())
        .join(DISCUSSION.to_string())
        .join("100");
    std::fs::create_dir_all(&source_dir).unwrap();
    std::fs::write(source_dir.join("report.pdf"), b"pdf").unwrap();

    let state = create_app_state(&db_path);
    seed_course(&state);
    let response = move_with_token(&state, DISCUSSION, TARGET_FORUM, CALLER).unwrap();
    assert!(response.warnings.is_empty());

    let moved = data_root
        .path()
        .join(COURSE_ID.to_string())
        .join("forumdata")
        .join(TARGET_FORUM.to_string())
        .join(DISCUSSION.to_string())
        .join("100")
        .join("report.pdf");
    assert_eq!(std::fs::read(moved).unwrap(), b"pdf");
    assert!(!source_dir.join("report.pdf").exists());
}
