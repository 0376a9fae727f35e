// ==========================================
// 论坛讨论迁移引擎 - 一次性会话令牌
// ==========================================
// 职责: 防止重复提交，令牌签发后只能被签发用户消费一次
// 过期: 超过有效期的令牌在签发/消费时清理
// ==========================================

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::api::error::{ApiError, ApiResult};

/// 令牌默认有效期（分钟）
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy)]
struct IssuedToken {
    user_id: i64,
    issued_at: DateTime<Utc>,
}

/// 会话令牌登记表
#[derive(Debug)]
pub struct SessionTokenRegistry {
    tokens: Mutex<HashMap<String, IssuedToken>>,
    ttl: Duration,
}

impl Default for SessionTokenRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }
}

impl SessionTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock_pruned(
        &self,
        now: DateTime<Utc>,
    ) -> ApiResult<MutexGuard<'_, HashMap<String, IssuedToken>>> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|e| ApiError::InternalError(format!("令牌表锁获取失败: {}", e)))?;
        let before = tokens.len();
        tokens.retain(|_, issued| now - issued.issued_at < self.ttl);
        let pruned = before - tokens.len();
        if pruned > 0 {
            tracing::debug!(pruned, "过期会话令牌已清理");
        }
        Ok(tokens)
    }

    /// 为用户签发令牌
    pub fn issue(&self, user_id: i64) -> ApiResult<String> {
        let now = Utc::now();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut tokens = self.lock_pruned(now)?;
        tokens.insert(
            token.clone(),
            IssuedToken {
                user_id,
                issued_at: now,
            },
        );
        Ok(token)
    }

    /// 消费令牌；不存在、已过期、已使用或属于其他用户时拒绝
    pub fn consume(&self, token: &str, user_id: i64) -> ApiResult<()> {
        let mut tokens = self.lock_pruned(Utc::now())?;

        match tokens.get(token) {
            Some(issued) if issued.user_id == user_id => {
                tokens.remove(token);
                Ok(())
            }
            _ => {
                tracing::warn!(user_id, "会话令牌校验失败");
                Err(ApiError::invalid_session_token())
            }
        }
    }

    pub fn outstanding(&self) -> usize {
        self.tokens.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_single_use() {
        let registry = SessionTokenRegistry::new();
        let token = registry.issue(7).unwrap();
        assert_eq!(registry.outstanding(), 1);

        assert!(registry.consume(&token, 7).is_ok());
        assert!(matches!(
            registry.consume(&token, 7),
            Err(ApiError::InvalidSessionToken(_))
        ));
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_token_bound_to_user() {
        let registry = SessionTokenRegistry::new();
        let token = registry.issue(7).unwrap();

        assert!(registry.consume(&token, 8).is_err());
        assert!(registry.consume(&token, 7).is_ok());
    }

    #[test]
    fn test_expired_tokens_rejected_and_pruned() {
        let registry = SessionTokenRegistry::with_ttl(Duration::zero());
        let first = registry.issue(7).unwrap();
        let second = registry.issue(7).unwrap();

        // 签发第二个令牌时第一个已过期并被清理
        assert_eq!(registry.outstanding(), 1);
        assert!(matches!(
            registry.consume(&first, 7),
            Err(ApiError::InvalidSessionToken(_))
        ));
        assert!(registry.consume(&second, 7).is_err());
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let registry = SessionTokenRegistry::new();
        assert!(registry.consume("nope", 1).is_err());
    }
}
