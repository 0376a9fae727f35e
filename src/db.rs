// ==========================================
// 论坛讨论迁移引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等，记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建迁移引擎所需的全部表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS forumx (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'general',
            forcesubscribe INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS course_modules (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            forum_id INTEGER NOT NULL UNIQUE REFERENCES forumx(id) ON DELETE CASCADE,
            visible INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS forumx_discussions (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            forumx INTEGER NOT NULL REFERENCES forumx(id),
            name TEXT NOT NULL,
            groupid INTEGER NOT NULL DEFAULT -1,
            firstpost INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS user_enrolments (
            course_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            PRIMARY KEY (course_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS group_members (
            group_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            PRIMARY KEY (group_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS role_capabilities (
            user_id INTEGER NOT NULL,
            forum_id INTEGER NOT NULL,
            capability TEXT NOT NULL,
            PRIMARY KEY (user_id, forum_id, capability)
        );

        CREATE TABLE IF NOT EXISTS forumx_subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            forum_id INTEGER NOT NULL REFERENCES forumx(id) ON DELETE CASCADE,
            subscribed INTEGER NOT NULL DEFAULT 1,
            UNIQUE (user_id, forum_id)
        );

        CREATE TABLE IF NOT EXISTS forumx_discussion_subs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            forum_id INTEGER NOT NULL REFERENCES forumx(id),
            user_id INTEGER NOT NULL,
            discussion_id INTEGER NOT NULL REFERENCES forumx_discussions(id) ON DELETE CASCADE,
            preference INTEGER NOT NULL,
            UNIQUE (user_id, discussion_id)
        );

        CREATE INDEX IF NOT EXISTS idx_discussion_subs_forum
            ON forumx_discussion_subs(forum_id);

        CREATE TABLE IF NOT EXISTS forumx_read (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            forum_id INTEGER NOT NULL,
            discussion_id INTEGER NOT NULL REFERENCES forumx_discussions(id) ON DELETE CASCADE,
            post_id INTEGER NOT NULL,
            first_read INTEGER NOT NULL,
            last_read INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_forumx_read_discussion
            ON forumx_read(discussion_id);

        CREATE TABLE IF NOT EXISTS audit_log (
            event_id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            object_id INTEGER NOT NULL,
            context_forum_id INTEGER NOT NULL,
            actor INTEGER NOT NULL,
            other_json TEXT NOT NULL,
            snapshots_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
