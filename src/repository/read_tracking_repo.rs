// ==========================================
// 论坛讨论迁移引擎 - 阅读跟踪仓储
// ==========================================
// 职责: 管理 forumx_read 表
// 说明: 迁移时 forum_id 的改写在 DiscussionRelocationRepository 事务内完成
// ==========================================

use crate::domain::ReadRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ReadTrackingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReadTrackingRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, record: &ReadRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forumx_read (user_id, forum_id, discussion_id, post_id, first_read, last_read)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.user_id,
                record.forum_id,
                record.discussion_id,
                record.post_id,
                record.first_read.and_utc().timestamp(),
                record.last_read.and_utc().timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_discussion(&self, discussion_id: i64) -> RepositoryResult<Vec<ReadRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, forum_id, discussion_id, post_id, first_read, last_read
            FROM forumx_read
            WHERE discussion_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let raw = stmt
            .query_map(params![discussion_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        raw.into_iter()
            .map(|(user_id, forum_id, discussion_id, post_id, first_read, last_read)| {
                Ok(ReadRecord {
                    user_id,
                    forum_id,
                    discussion_id,
                    post_id,
                    first_read: from_unix(first_read, "forumx_read.first_read")?,
                    last_read: from_unix(last_read, "forumx_read.last_read")?,
                })
            })
            .collect()
    }
}

fn from_unix(ts: i64, field: &str) -> RepositoryResult<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("时间戳越界: {}", ts),
        })
}
