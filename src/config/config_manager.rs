// ==========================================
// 论坛讨论迁移引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// RelocationConfig - 迁移相关配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationConfig {
    pub enable_rss_feeds: bool,               // 是否启用 RSS
    pub rss_cache_dir: Option<PathBuf>,       // RSS 缓存根目录
    pub attachment_data_root: Option<PathBuf>, // 附件数据根目录
    pub session_token_required: bool,        // 是否强制一次性会话令牌
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            enable_rss_feeds: false,
            rss_cache_dir: None,
            attachment_data_root: None,
            session_token_required: true,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 迁移配置 =====

    /// 读取迁移相关配置，缺省项使用默认值
    pub fn relocation_config(&self) -> Result<RelocationConfig, Box<dyn Error>> {
        let defaults = RelocationConfig::default();

        let enable_rss_feeds = self
            .get_config_value(config_keys::ENABLE_RSS_FEEDS)?
            .map(|v| parse_flag(config_keys::ENABLE_RSS_FEEDS, &v, defaults.enable_rss_feeds))
            .unwrap_or(defaults.enable_rss_feeds);
        let session_token_required = self
            .get_config_value(config_keys::SESSION_TOKEN_REQUIRED)?
            .map(|v| {
                parse_flag(
                    config_keys::SESSION_TOKEN_REQUIRED,
                    &v,
                    defaults.session_token_required,
                )
            })
            .unwrap_or(defaults.session_token_required);

        Ok(RelocationConfig {
            enable_rss_feeds,
            rss_cache_dir: self.get_path(config_keys::RSS_CACHE_DIR)?,
            attachment_data_root: self.get_path(config_keys::ATTACHMENT_DATA_ROOT)?,
            session_token_required,
        })
    }

    fn get_path(&self, key: &str) -> Result<Option<PathBuf>, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from))
    }
}

/// 解析开关配置（1/0, true/false），无法识别时使用默认值
fn parse_flag(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => true,
        "0" | "false" | "no" => false,
        _ => {
            tracing::warn!(config_key = key, raw_value = %raw, "开关配置格式错误，使用默认值");
            default
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // RSS
    pub const ENABLE_RSS_FEEDS: &str = "enablerssfeeds";
    pub const RSS_CACHE_DIR: &str = "rss_cache_dir";

    // 附件
    pub const ATTACHMENT_DATA_ROOT: &str = "attachment_data_root";

    // 防重复提交
    pub const SESSION_TOKEN_REQUIRED: &str = "session_token_required";
}
