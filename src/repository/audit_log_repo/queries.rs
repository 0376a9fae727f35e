use super::core::AuditLogRepository;
use crate::domain::AuditEvent;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

impl AuditLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 event_id 查询单个事件
    pub fn find_by_id(&self, event_id: &str) -> RepositoryResult<Option<AuditEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, event_type, object_id, context_forum_id, actor,
                   other_json, snapshots_json, created_at
            FROM audit_log
            WHERE event_id = ?
            "#,
        )?;

        match stmt.query_row(params![event_id], |row| self.map_row(row)) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询对象（讨论）的全部事件，按时间升序
    pub fn find_by_object(&self, event_type: &str, object_id: i64) -> RepositoryResult<Vec<AuditEvent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, event_type, object_id, context_forum_id, actor,
                   other_json, snapshots_json, created_at
            FROM audit_log
            WHERE event_type = ? AND object_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;

        let events = stmt
            .query_map(params![event_type, object_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(events)
    }

    /// 将数据库行映射为 AuditEvent
    fn map_row(&self, row: &Row) -> SqliteResult<AuditEvent> {
        let other_json_str: String = row.get(5)?;
        let snapshots_json_str: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;

        let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

        let other_json = serde_json::from_str(&other_json_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;
        let snapshots_json = serde_json::from_str(&snapshots_json_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(AuditEvent {
            event_id: row.get(0)?,
            event_type: row.get(1)?,
            object_id: row.get(2)?,
            context_forum_id: row.get(3)?,
            actor: row.get(4)?,
            created_at,
            other_json,
            snapshots_json,
        })
    }
}
