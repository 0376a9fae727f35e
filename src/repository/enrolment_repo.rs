// ==========================================
// 论坛讨论迁移引擎 - 选课/分组仓储
// ==========================================
// 职责: 管理 user_enrolments / group_members 表
// 说明: 订阅者枚举时用于限定课程成员与分组范围
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct EnrolmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrolmentRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn enrol(&self, course_id: i64, user_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_enrolments (course_id, user_id) VALUES (?1, ?2)",
            params![course_id, user_id],
        )?;
        Ok(())
    }

    pub fn add_group_member(&self, group_id: i64, user_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
            params![group_id, user_id],
        )?;
        Ok(())
    }

    /// 课程成员（可选分组过滤），按用户ID升序
    pub fn list_enrolled(&self, course_id: i64, group_id: Option<i64>) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ue.user_id
            FROM user_enrolments ue
            WHERE ue.course_id = ?1
              AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM group_members gm
                    WHERE gm.group_id = ?2 AND gm.user_id = ue.user_id))
            ORDER BY ue.user_id ASC
            "#,
        )?;

        let users = stmt
            .query_map(params![course_id, group_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }
}
