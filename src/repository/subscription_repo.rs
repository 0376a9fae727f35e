// ==========================================
// 论坛讨论迁移引擎 - 订阅仓储
// ==========================================
// 职责: 管理 forumx_subscriptions / forumx_discussion_subs 表
// 红线: Repository 不做订阅判定,只做数据映射
// ==========================================

use crate::domain::{DiscussionPreference, DiscussionSubscription, ForumSubscription};
use crate::engine::ports::{CollaboratorResult, SubscriptionLoader};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct SubscriptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubscriptionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 论坛级订阅
    // ==========================================

    pub fn upsert_forum_subscription(&self, sub: &ForumSubscription) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forumx_subscriptions (user_id, forum_id, subscribed)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, forum_id) DO UPDATE SET
                subscribed = excluded.subscribed
            "#,
            params![sub.user_id, sub.forum_id, sub.subscribed],
        )?;
        Ok(())
    }

    pub fn find_forum_subscriptions(&self, forum_id: i64) -> RepositoryResult<Vec<ForumSubscription>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, forum_id, subscribed
            FROM forumx_subscriptions
            WHERE forum_id = ?1
            ORDER BY user_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![forum_id], |row| {
                Ok(ForumSubscription {
                    user_id: row.get(0)?,
                    forum_id: row.get(1)?,
                    subscribed: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 显式订阅论坛的课程成员（可选分组过滤）
    pub fn list_forum_subscribers(
        &self,
        forum_id: i64,
        course_id: i64,
        group_id: Option<i64>,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.user_id
            FROM forumx_subscriptions s
            WHERE s.forum_id = ?1
              AND s.subscribed = 1
              AND EXISTS (
                    SELECT 1 FROM user_enrolments ue
                    WHERE ue.course_id = ?2 AND ue.user_id = s.user_id)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM group_members gm
                    WHERE gm.group_id = ?3 AND gm.user_id = s.user_id))
            ORDER BY s.user_id ASC
            "#,
        )?;

        let users = stmt
            .query_map(params![forum_id, course_id, group_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    // ==========================================
    // 讨论级订阅
    // ==========================================

    pub fn upsert_discussion_subscription(&self, sub: &DiscussionSubscription) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forumx_discussion_subs (forum_id, user_id, discussion_id, preference)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, discussion_id) DO UPDATE SET
                forum_id = excluded.forum_id,
                preference = excluded.preference
            "#,
            params![
                sub.forum_id,
                sub.user_id,
                sub.discussion_id,
                sub.preference.to_stored(),
            ],
        )?;
        Ok(())
    }

    /// 论坛内全部讨论级订阅（填充缓存用）
    pub fn find_discussion_subscriptions_by_forum(
        &self,
        forum_id: i64,
    ) -> RepositoryResult<Vec<DiscussionSubscription>> {
        self.query_discussion_subscriptions(
            r#"
            SELECT user_id, forum_id, discussion_id, preference
            FROM forumx_discussion_subs
            WHERE forum_id = ?1
            ORDER BY discussion_id ASC, user_id ASC
            "#,
            forum_id,
        )
    }

    pub fn find_discussion_subscriptions_by_discussion(
        &self,
        discussion_id: i64,
    ) -> RepositoryResult<Vec<DiscussionSubscription>> {
        self.query_discussion_subscriptions(
            r#"
            SELECT user_id, forum_id, discussion_id, preference
            FROM forumx_discussion_subs
            WHERE discussion_id = ?1
            ORDER BY user_id ASC
            "#,
            discussion_id,
        )
    }

    /// 持有讨论级订阅记录（订阅或退订）的课程成员（可选分组过滤）
    pub fn list_discussion_subscribers(
        &self,
        forum_id: i64,
        course_id: i64,
        group_id: Option<i64>,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT ds.user_id
            FROM forumx_discussion_subs ds
            WHERE ds.forum_id = ?1
              AND EXISTS (
                    SELECT 1 FROM user_enrolments ue
                    WHERE ue.course_id = ?2 AND ue.user_id = ds.user_id)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM group_members gm
                    WHERE gm.group_id = ?3 AND gm.user_id = ds.user_id))
            ORDER BY ds.user_id ASC
            "#,
        )?;

        let users = stmt
            .query_map(params![forum_id, course_id, group_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    fn query_discussion_subscriptions(
        &self,
        sql: &str,
        key: i64,
    ) -> RepositoryResult<Vec<DiscussionSubscription>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
            .query_map(params![key], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        raw.into_iter()
            .map(|(user_id, forum_id, discussion_id, preference)| {
                let preference = DiscussionPreference::from_stored(preference).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "forumx_discussion_subs.preference".to_string(),
                        message: format!("无效的订阅偏好: {}", preference),
                    }
                })?;
                Ok(DiscussionSubscription {
                    user_id,
                    forum_id,
                    discussion_id,
                    preference,
                })
            })
            .collect()
    }
}

// ==========================================
// SubscriptionLoader 实现（订阅缓存数据源）
// ==========================================
impl SubscriptionLoader for SubscriptionRepository {
    fn load_forum_subscriptions(&self, forum_id: i64) -> CollaboratorResult<Vec<ForumSubscription>> {
        Ok(self.find_forum_subscriptions(forum_id)?)
    }

    fn load_discussion_subscriptions(
        &self,
        forum_id: i64,
    ) -> CollaboratorResult<Vec<DiscussionSubscription>> {
        Ok(self.find_discussion_subscriptions_by_forum(forum_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_repo() -> (SubscriptionRepository, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO forumx (id, course_id, name, type, forcesubscribe) VALUES (100, 1, 'F1', 'general', 0);
            INSERT INTO forumx_discussions (id, course_id, forumx, name, groupid, firstpost) VALUES (10, 1, 100, 'D', -1, 1);
            INSERT INTO user_enrolments (course_id, user_id) VALUES (1, 1), (1, 2), (1, 3);
            INSERT INTO group_members (group_id, user_id) VALUES (5, 2);
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (SubscriptionRepository::from_connection(conn.clone()), conn)
    }

    #[test]
    fn test_upsert_forum_subscription_overwrites() {
        let (repo, _conn) = setup_repo();
        repo.upsert_forum_subscription(&ForumSubscription {
            user_id: 1,
            forum_id: 100,
            subscribed: true,
        })
        .unwrap();
        repo.upsert_forum_subscription(&ForumSubscription {
            user_id: 1,
            forum_id: 100,
            subscribed: false,
        })
        .unwrap();

        let rows = repo.find_forum_subscriptions(100).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].subscribed);
    }

    #[test]
    fn test_list_forum_subscribers_requires_enrolment_and_group() {
        let (repo, _conn) = setup_repo();
        for user in [1, 2, 4] {
            repo.upsert_forum_subscription(&ForumSubscription {
                user_id: user,
                forum_id: 100,
                subscribed: true,
            })
            .unwrap();
        }
        repo.upsert_forum_subscription(&ForumSubscription {
            user_id: 3,
            forum_id: 100,
            subscribed: false,
        })
        .unwrap();

        // 用户4未选课, 用户3显式退订
        assert_eq!(repo.list_forum_subscribers(100, 1, None).unwrap(), vec![1, 2]);
        assert_eq!(repo.list_forum_subscribers(100, 1, Some(5)).unwrap(), vec![2]);
    }

    #[test]
    fn test_discussion_subscriptions_by_forum_and_discussion() {
        let (repo, _conn) = setup_repo();
        let since = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        repo.upsert_discussion_subscription(&DiscussionSubscription {
            user_id: 1,
            forum_id: 100,
            discussion_id: 10,
            preference: DiscussionPreference::Unsubscribed,
        })
        .unwrap();
        repo.upsert_discussion_subscription(&DiscussionSubscription {
            user_id: 3,
            forum_id: 100,
            discussion_id: 10,
            preference: DiscussionPreference::Subscribed { since },
        })
        .unwrap();

        let by_forum = repo.find_discussion_subscriptions_by_forum(100).unwrap();
        assert_eq!(by_forum.len(), 2);
        let by_discussion = repo.find_discussion_subscriptions_by_discussion(10).unwrap();
        assert_eq!(by_discussion[1].preference, DiscussionPreference::Subscribed { since });
        assert_eq!(repo.list_discussion_subscribers(100, 1, None).unwrap(), vec![1, 3]);
        assert!(repo.list_discussion_subscribers(100, 1, Some(5)).unwrap().is_empty());
    }
}
