// ==========================================
// 论坛讨论迁移引擎 - 论坛/讨论仓储
// ==========================================
// 职责: 管理 forumx / forumx_discussions / course_modules 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{CourseModule, Discussion, Forum, ForumType, GroupScope, SubscriptionMode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct ForumRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ForumRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 论坛
    // ==========================================

    pub fn insert_forum(&self, forum: &Forum) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forumx (id, course_id, name, type, forcesubscribe)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                forum.id,
                forum.course_id,
                forum.name,
                forum.forum_type.as_str(),
                forum.subscription_mode.code(),
            ],
        )?;
        Ok(())
    }

    pub fn find_forum(&self, forum_id: i64) -> RepositoryResult<Option<Forum>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                "SELECT id, course_id, name, type, forcesubscribe FROM forumx WHERE id = ?1",
                params![forum_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, course_id, name, forum_type, mode)) = raw else {
            return Ok(None);
        };

        let forum_type = ForumType::parse(&forum_type).ok_or_else(|| RepositoryError::FieldValueError {
            field: "forumx.type".to_string(),
            message: format!("未知论坛类型: {}", forum_type),
        })?;
        let subscription_mode =
            SubscriptionMode::from_code(mode).ok_or_else(|| RepositoryError::FieldValueError {
                field: "forumx.forcesubscribe".to_string(),
                message: format!("未知订阅模式: {}", mode),
            })?;

        Ok(Some(Forum {
            id,
            course_id,
            name,
            forum_type,
            subscription_mode,
        }))
    }

    // ==========================================
    // 课程模块
    // ==========================================

    pub fn insert_course_module(&self, module: &CourseModule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO course_modules (id, course_id, forum_id, visible) VALUES (?1, ?2, ?3, ?4)",
            params![module.id, module.course_id, module.forum_id, module.visible],
        )?;
        Ok(())
    }

    pub fn find_course_module(&self, forum_id: i64) -> RepositoryResult<Option<CourseModule>> {
        let conn = self.get_conn()?;
        let module = conn
            .query_row(
                "SELECT id, course_id, forum_id, visible FROM course_modules WHERE forum_id = ?1",
                params![forum_id],
                |row| {
                    Ok(CourseModule {
                        id: row.get(0)?,
                        course_id: row.get(1)?,
                        forum_id: row.get(2)?,
                        visible: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(module)
    }

    // ==========================================
    // 讨论
    // ==========================================

    pub fn insert_discussion(&self, discussion: &Discussion) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forumx_discussions (id, course_id, forumx, name, groupid, firstpost)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                discussion.id,
                discussion.course_id,
                discussion.forum_id,
                discussion.name,
                discussion.group_scope.to_stored(),
                discussion.first_post_id,
            ],
        )?;
        Ok(())
    }

    pub fn find_discussion(&self, discussion_id: i64) -> RepositoryResult<Option<Discussion>> {
        let conn = self.get_conn()?;
        let discussion = conn
            .query_row(
                r#"
                SELECT id, course_id, forumx, name, groupid, firstpost
                FROM forumx_discussions
                WHERE id = ?1
                "#,
                params![discussion_id],
                |row| {
                    Ok(Discussion {
                        id: row.get(0)?,
                        course_id: row.get(1)?,
                        forum_id: row.get(2)?,
                        name: row.get(3)?,
                        group_scope: GroupScope::from_stored(row.get(4)?),
                        first_post_id: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(discussion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> ForumRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ForumRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn make_forum(id: i64, forum_type: ForumType) -> Forum {
        Forum {
            id,
            course_id: 1,
            name: format!("论坛{}", id),
            forum_type,
            subscription_mode: SubscriptionMode::Optional,
        }
    }

    #[test]
    fn test_insert_and_find_forum() {
        let repo = setup_repo();
        repo.insert_forum(&make_forum(100, ForumType::News)).unwrap();

        let found = repo.find_forum(100).unwrap().unwrap();
        assert_eq!(found.forum_type, ForumType::News);
        assert_eq!(found.subscription_mode, SubscriptionMode::Optional);
        assert!(repo.find_forum(999).unwrap().is_none());
    }

    #[test]
    fn test_find_forum_rejects_unknown_type() {
        let repo = setup_repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "INSERT INTO forumx (id, course_id, name, type, forcesubscribe) VALUES (1, 1, 'x', 'wiki', 0)",
                [],
            )
            .unwrap();
        }

        let result = repo.find_forum(1);
        assert!(matches!(result, Err(RepositoryError::FieldValueError { .. })));
    }

    #[test]
    fn test_discussion_group_sentinel_roundtrip() {
        let repo = setup_repo();
        repo.insert_forum(&make_forum(100, ForumType::General)).unwrap();
        repo.insert_discussion(&Discussion {
            id: 10,
            course_id: 1,
            forum_id: 100,
            name: "D".to_string(),
            group_scope: GroupScope::AllGroups,
            first_post_id: 1,
        })
        .unwrap();

        let d = repo.find_discussion(10).unwrap().unwrap();
        assert_eq!(d.group_scope, GroupScope::AllGroups);
        assert_eq!(d.forum_id, 100);
    }

    #[test]
    fn test_find_course_module() {
        let repo = setup_repo();
        repo.insert_forum(&make_forum(100, ForumType::General)).unwrap();
        repo.insert_course_module(&CourseModule {
            id: 7,
            course_id: 1,
            forum_id: 100,
            visible: false,
        })
        .unwrap();

        let module = repo.find_course_module(100).unwrap().unwrap();
        assert_eq!(module.id, 7);
        assert!(!module.visible);
        assert!(repo.find_course_module(200).unwrap().is_none());
    }
}
