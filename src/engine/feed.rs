// ==========================================
// 论坛讨论迁移引擎 - RSS 订阅源失效
// ==========================================
// 缓存文件: <cache_dir>/rss/mod_forumx/<forum_id>_*
// ==========================================

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Forum;
use crate::engine::ports::{CollaboratorResult, FeedInvalidator};

const FEED_CACHE_SUBDIR: &str = "rss/mod_forumx";

/// 删除论坛缓存的 RSS 文件
pub struct RssFeedInvalidator {
    cache_dir: PathBuf,
}

impl RssFeedInvalidator {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn feed_dir(&self) -> PathBuf {
        self.cache_dir.join(FEED_CACHE_SUBDIR)
    }

    fn is_feed_of(path: &Path, forum_id: i64) -> bool {
        let prefix = format!("{}_", forum_id);
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(&prefix))
            .unwrap_or(false)
    }
}

impl FeedInvalidator for RssFeedInvalidator {
    fn invalidate(&self, forum: &Forum) -> CollaboratorResult<()> {
        let dir = self.feed_dir();
        if !dir.is_dir() {
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && Self::is_feed_of(&path, forum.id) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        tracing::info!(forum_id = forum.id, removed, "RSS 缓存已失效");
        Ok(())
    }
}

/// RSS 未启用时使用
#[derive(Debug, Clone, Default)]
pub struct NoOpFeedInvalidator;

impl FeedInvalidator for NoOpFeedInvalidator {
    fn invalidate(&self, forum: &Forum) -> CollaboratorResult<()> {
        tracing::debug!("NoOpFeedInvalidator: 跳过 forum_id={}", forum.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForumType, SubscriptionMode};

    fn forum(id: i64) -> Forum {
        Forum {
            id,
            course_id: 1,
            name: "F".to_string(),
            forum_type: ForumType::General,
            subscription_mode: SubscriptionMode::Optional,
        }
    }

    #[test]
    fn test_removes_only_files_of_forum() {
        let temp = tempfile::tempdir().unwrap();
        let invalidator = RssFeedInvalidator::new(temp.path());
        let dir = invalidator.feed_dir();
        fs::create_dir_all(&dir).unwrap();
        for name in ["100_abc.xml", "100_def.xml", "1000_x.xml", "200_abc.xml"] {
            fs::write(dir.join(name), "<rss/>").unwrap();
        }

        invalidator.invalidate(&forum(100)).unwrap();

        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left, vec!["1000_x.xml", "200_abc.xml"]);
    }

    #[test]
    fn test_missing_cache_dir_is_ok() {
        let temp = tempfile::tempdir().unwrap();
        let invalidator = RssFeedInvalidator::new(temp.path().join("absent"));
        assert!(invalidator.invalidate(&forum(100)).is_ok());
        assert!(NoOpFeedInvalidator.invalidate(&forum(100)).is_ok());
    }
}
