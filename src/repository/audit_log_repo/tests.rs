use super::AuditLogRepository;
use crate::domain::{AuditEvent, AuditEventType};
use crate::engine::ports::AuditSink;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_test_event(event_id: &str, discussion_id: i64, hour: u32) -> AuditEvent {
    AuditEvent {
        event_id: event_id.to_string(),
        event_type: AuditEventType::DiscussionMoved.as_str().to_string(),
        object_id: discussion_id,
        context_forum_id: 200,
        actor: 7,
        created_at: NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
        other_json: json!({ "fromforumid": 100, "toforumid": 200 }),
        snapshots_json: json!({ "forumx_discussions": [], "forumx": [] }),
    }
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = AuditLogRepository::new(setup_test_db());

    let event = make_test_event("evt1", 10, 9);
    assert_eq!(repo.insert(&event).unwrap(), "evt1");

    let found = repo.find_by_id("evt1").unwrap().unwrap();
    assert_eq!(found, event);
    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_find_by_object_orders_by_time() {
    let repo = AuditLogRepository::new(setup_test_db());

    repo.insert(&make_test_event("late", 10, 12)).unwrap();
    repo.insert(&make_test_event("early", 10, 8)).unwrap();
    repo.insert(&make_test_event("other", 11, 9)).unwrap();

    let events = repo.find_by_object("discussion_moved", 10).unwrap();
    let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn test_record_through_audit_sink() {
    let repo = AuditLogRepository::new(setup_test_db());
    let sink: &dyn AuditSink = &repo;

    sink.record(&make_test_event("evt2", 10, 9)).unwrap();
    sink.record(&make_test_event("evt2", 10, 9)).unwrap_err();

    assert_eq!(repo.find_by_object("discussion_moved", 10).unwrap().len(), 1);
}
