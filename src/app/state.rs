// ==========================================
// 论坛讨论迁移引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DiscussionApi, SessionTokenRegistry};
use crate::config::{ConfigManager, RelocationConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    AttachmentRelocator, AuditEventEmitter, FeedInvalidator, FileAttachmentRelocator,
    MoveTransactionExecutor, NoOpAttachmentRelocator, NoOpFeedInvalidator, RelocationCollaborators,
    RelocationRepositories, RepositorySubscriberEnumerator, RssFeedInvalidator, SubscriptionCache,
};
use crate::repository::{
    AuditLogRepository, CapabilityRepository, DiscussionRelocationRepository, EnrolmentRepository,
    ForumRepository, ReadTrackingRepository, SubscriptionRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 讨论迁移API
    pub discussion_api: Arc<DiscussionApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 订阅缓存（迁移执行器共享）
    pub subscription_cache: Arc<SubscriptionCache>,

    pub forum_repo: Arc<ForumRepository>,
    pub subscription_repo: Arc<SubscriptionRepository>,
    pub enrolment_repo: Arc<EnrolmentRepository>,
    pub capability_repo: Arc<CapabilityRepository>,
    pub read_tracking_repo: Arc<ReadTrackingRepository>,
    pub audit_log_repo: Arc<AuditLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化表结构
    /// 2. 初始化所有Repository
    /// 3. 按配置装配外部协作方与迁移执行器
    /// 4. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let forum_repo = Arc::new(ForumRepository::from_connection(conn.clone()));
        let subscription_repo = Arc::new(SubscriptionRepository::from_connection(conn.clone()));
        let enrolment_repo = Arc::new(EnrolmentRepository::from_connection(conn.clone()));
        let capability_repo = Arc::new(CapabilityRepository::from_connection(conn.clone()));
        let read_tracking_repo = Arc::new(ReadTrackingRepository::from_connection(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));
        let relocation_repo = Arc::new(DiscussionRelocationRepository::from_connection(conn.clone()));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config = config_manager
            .relocation_config()
            .map_err(|e| format!("读取迁移配置失败: {}", e))?;
        tracing::info!(?config, "迁移配置已加载");

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let subscription_cache = Arc::new(SubscriptionCache::new());
        let collaborators = RelocationCollaborators::new(
            capability_repo.clone(),
            build_attachment_relocator(&config),
            Arc::new(RepositorySubscriberEnumerator::new(
                enrolment_repo.clone(),
                subscription_repo.clone(),
            )),
            build_feed_invalidator(&config),
        );
        let executor = Arc::new(MoveTransactionExecutor::new(
            RelocationRepositories::new(
                forum_repo.clone(),
                subscription_repo.clone(),
                relocation_repo,
            ),
            collaborators,
            subscription_cache.clone(),
            AuditEventEmitter::with_sink(audit_log_repo.clone()),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let discussion_api = Arc::new(DiscussionApi::new(
            executor,
            forum_repo.clone(),
            Arc::new(SessionTokenRegistry::new()),
            config.session_token_required,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            discussion_api,
            config_manager,
            subscription_cache,
            forum_repo,
            subscription_repo,
            enrolment_repo,
            capability_repo,
            read_tracking_repo,
            audit_log_repo,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

fn build_attachment_relocator(config: &RelocationConfig) -> Arc<dyn AttachmentRelocator> {
    match &config.attachment_data_root {
        Some(root) => Arc::new(FileAttachmentRelocator::new(root.clone())),
        None => Arc::new(NoOpAttachmentRelocator),
    }
}

fn build_feed_invalidator(config: &RelocationConfig) -> Arc<dyn FeedInvalidator> {
    match (&config.rss_cache_dir, config.enable_rss_feeds) {
        (Some(dir), true) => Arc::new(RssFeedInvalidator::new(dir.clone())),
        _ => Arc::new(NoOpFeedInvalidator),
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 FORUMX_RELOCATION_DB_PATH，其次用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FORUMX_RELOCATION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./forumx_relocation.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("forumx-relocation");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("forumx_relocation.db");
        }
    }

    path.to_string_lossy().to_string()
}
