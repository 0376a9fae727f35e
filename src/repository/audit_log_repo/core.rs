use crate::domain::AuditEvent;
use crate::engine::ports::{AuditSink, CollaboratorResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入审计事件
    ///
    /// # 返回
    /// - `Ok(event_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, event: &AuditEvent) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (
                event_id, event_type, object_id, context_forum_id, actor,
                other_json, snapshots_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                event.event_id,
                event.event_type,
                event.object_id,
                event.context_forum_id,
                event.actor,
                event.other_json.to_string(),
                event.snapshots_json.to_string(),
                event.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(event.event_id.clone())
    }
}

impl AuditSink for AuditLogRepository {
    fn record(&self, event: &AuditEvent) -> CollaboratorResult<()> {
        self.insert(event)?;
        Ok(())
    }
}
