// ==========================================
// 论坛讨论迁移引擎 - 权限仓储
// ==========================================
// 职责: 管理 role_capabilities 表 (用户 × 论坛上下文 × 权限)
// 说明: 实现引擎层 CapabilityChecker
// ==========================================

use crate::domain::Capability;
use crate::engine::ports::{CapabilityChecker, CollaboratorResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CapabilityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CapabilityRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn grant(&self, user_id: i64, forum_id: i64, capability: Capability) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO role_capabilities (user_id, forum_id, capability) VALUES (?1, ?2, ?3)",
            params![user_id, forum_id, capability.as_str()],
        )?;
        Ok(())
    }

    pub fn revoke(&self, user_id: i64, forum_id: i64, capability: Capability) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM role_capabilities WHERE user_id = ?1 AND forum_id = ?2 AND capability = ?3",
            params![user_id, forum_id, capability.as_str()],
        )?;
        Ok(rows)
    }

    pub fn has(&self, user_id: i64, forum_id: i64, capability: Capability) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                r#"
                SELECT 1 FROM role_capabilities
                WHERE user_id = ?1 AND forum_id = ?2 AND capability = ?3
                LIMIT 1
                "#,
                params![user_id, forum_id, capability.as_str()],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }
}

impl CapabilityChecker for CapabilityRepository {
    fn has_capability(
        &self,
        capability: Capability,
        forum_id: i64,
        user_id: i64,
    ) -> CollaboratorResult<bool> {
        Ok(self.has(user_id, forum_id, capability)?)
    }
}
