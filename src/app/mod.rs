// ==========================================
// 论坛讨论迁移引擎 - 应用层
// ==========================================
// 职责: 装配仓储、引擎与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
