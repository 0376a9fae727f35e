// ==========================================
// 论坛讨论迁移引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与宿主应用调用
// ==========================================

pub mod discussion_api;
pub mod error;
pub mod session;

// 重导出核心类型
pub use discussion_api::{discussion_redirect_url, DiscussionApi, MoveResponse};
pub use error::{ApiError, ApiResult};
pub use session::SessionTokenRegistry;
