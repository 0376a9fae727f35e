// ==========================================
// 论坛讨论迁移引擎 - 讨论迁移写入仓储
// ==========================================
// 职责: 在单个事务内完成迁移的全部记录改写
//   1. 讨论 forum_id 改写
//   2. 阅读跟踪 forum_id 改写（与 1 同一事务，二者不得不一致）
//   3. 删除讨论级订阅记录并按对账结果重建
// 红线: Repository 不做订阅判定,只落地引擎给出的结果
// ==========================================

use crate::domain::DiscussionSubscription;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 一次迁移的写入内容
#[derive(Debug, Clone)]
pub struct RelocationWrite {
    pub discussion_id: i64,
    pub to_forum_id: i64,
    /// 迁移后应存在的全部讨论级订阅记录
    pub subscriptions: Vec<DiscussionSubscription>,
}

/// 写入结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationWriteSummary {
    pub read_rows_moved: usize,
    pub subscriptions_deleted: usize,
    pub subscriptions_created: usize,
}

pub struct DiscussionRelocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DiscussionRelocationRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 事务内落地迁移
    ///
    /// # 返回
    /// - `Err(NotFound)`: 讨论不存在（事务回滚，无任何改写）
    pub fn apply(&self, write: &RelocationWrite) -> RepositoryResult<RelocationWriteSummary> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let updated = tx.execute(
            "UPDATE forumx_discussions SET forumx = ?1 WHERE id = ?2",
            params![write.to_forum_id, write.discussion_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("forumx_discussions", write.discussion_id));
        }

        let read_rows_moved = tx.execute(
            "UPDATE forumx_read SET forum_id = ?1 WHERE discussion_id = ?2",
            params![write.to_forum_id, write.discussion_id],
        )?;

        let subscriptions_deleted = tx.execute(
            "DELETE FROM forumx_discussion_subs WHERE discussion_id = ?1",
            params![write.discussion_id],
        )?;

        let mut subscriptions_created = 0;
        for sub in &write.subscriptions {
            tx.execute(
                r#"
                INSERT INTO forumx_discussion_subs (forum_id, user_id, discussion_id, preference)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    sub.forum_id,
                    sub.user_id,
                    sub.discussion_id,
                    sub.preference.to_stored(),
                ],
            )?;
            subscriptions_created += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(RelocationWriteSummary {
            read_rows_moved,
            subscriptions_deleted,
            subscriptions_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscussionPreference;

    fn setup() -> (DiscussionRelocationRepository, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO forumx (id, course_id, name, type, forcesubscribe) VALUES (100, 1, 'F1', 'general', 0);
            INSERT INTO forumx (id, course_id, name, type, forcesubscribe) VALUES (200, 1, 'F2', 'general', 0);
            INSERT INTO forumx_discussions (id, course_id, forumx, name, groupid, firstpost) VALUES (10, 1, 100, 'D', -1, 1);
            INSERT INTO forumx_read (user_id, forum_id, discussion_id, post_id, first_read, last_read) VALUES (1, 100, 10, 1, 0, 0);
            INSERT INTO forumx_read (user_id, forum_id, discussion_id, post_id, first_read, last_read) VALUES (2, 100, 10, 1, 0, 0);
            INSERT INTO forumx_discussion_subs (forum_id, user_id, discussion_id, preference) VALUES (100, 1, 10, -1);
            INSERT INTO forumx_discussion_subs (forum_id, user_id, discussion_id, preference) VALUES (100, 2, 10, 1700000000);
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (DiscussionRelocationRepository::from_connection(conn.clone()), conn)
    }

    #[test]
    fn test_apply_moves_discussion_and_read_rows_together() {
        let (repo, conn) = setup();

        let summary = repo
            .apply(&RelocationWrite {
                discussion_id: 10,
                to_forum_id: 200,
                subscriptions: vec![DiscussionSubscription {
                    user_id: 1,
                    forum_id: 200,
                    discussion_id: 10,
                    preference: DiscussionPreference::Unsubscribed,
                }],
            })
            .unwrap();

        assert_eq!(
            summary,
            RelocationWriteSummary {
                read_rows_moved: 2,
                subscriptions_deleted: 2,
                subscriptions_created: 1,
            }
        );

        let conn = conn.lock().unwrap();
        let forum: i64 = conn
            .query_row("SELECT forumx FROM forumx_discussions WHERE id = 10", [], |r| r.get(0))
            .unwrap();
        let mismatched: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM forumx_read WHERE discussion_id = 10 AND forum_id != ?1",
                [forum],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(forum, 200);
        assert_eq!(mismatched, 0);
    }

    #[test]
    fn test_apply_missing_discussion_rolls_back() {
        let (repo, conn) = setup();

        let result = repo.apply(&RelocationWrite {
            discussion_id: 999,
            to_forum_id: 200,
            subscriptions: vec![],
        });
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

        let conn = conn.lock().unwrap();
        let subs: i64 = conn
            .query_row("SELECT COUNT(*) FROM forumx_discussion_subs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(subs, 2);
    }
}
