// ==========================================
// 论坛讨论迁移引擎 - 附件迁移
// ==========================================
// 目录: <root>/<course_id>/forumdata/<forum_id>/<discussion_id>/...
// 规则: 逐文件迁移,单个文件失败不中断,最终返回是否全部成功
// ==========================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::Discussion;
use crate::engine::ports::AttachmentRelocator;

/// 基于文件系统的附件迁移
pub struct FileAttachmentRelocator {
    data_root: PathBuf,
}

impl FileAttachmentRelocator {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// 讨论附件目录
    pub fn discussion_dir(&self, course_id: i64, forum_id: i64, discussion_id: i64) -> PathBuf {
        self.data_root
            .join(course_id.to_string())
            .join("forumdata")
            .join(forum_id.to_string())
            .join(discussion_id.to_string())
    }

    /// 递归迁移目录，返回失败文件数
    fn move_tree(src: &Path, dst: &Path) -> io::Result<usize> {
        fs::create_dir_all(dst)?;
        let mut failures = 0;

        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let from = entry.path();
            let to = dst.join(entry.file_name());

            if from.is_dir() {
                failures += Self::move_tree(&from, &to).unwrap_or_else(|e| {
                    tracing::warn!(path = %from.display(), error = %e, "附件子目录迁移失败");
                    1
                });
                continue;
            }

            if let Err(e) = Self::move_file(&from, &to) {
                tracing::warn!(path = %from.display(), error = %e, "附件迁移失败");
                failures += 1;
            }
        }

        if failures == 0 {
            // 目录已空
            if let Err(e) = fs::remove_dir(src) {
                tracing::debug!(path = %src.display(), error = %e, "源附件目录删除失败");
            }
        }
        Ok(failures)
    }

    fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(_) => {
                // 跨设备时回退为复制后删除
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
        }
    }
}

impl AttachmentRelocator for FileAttachmentRelocator {
    fn relocate(&self, discussion: &Discussion, from_forum_id: i64, to_forum_id: i64) -> bool {
        let src = self.discussion_dir(discussion.course_id, from_forum_id, discussion.id);
        if !src.is_dir() {
            return true;
        }
        let dst = self.discussion_dir(discussion.course_id, to_forum_id, discussion.id);

        match Self::move_tree(&src, &dst) {
            Ok(0) => {
                tracing::info!(discussion_id = discussion.id, from_forum_id, to_forum_id, "附件已迁移");
                true
            }
            Ok(failures) => {
                tracing::warn!(discussion_id = discussion.id, failures, "附件部分迁移失败");
                false
            }
            Err(e) => {
                tracing::warn!(discussion_id = discussion.id, error = %e, "附件迁移失败");
                false
            }
        }
    }
}

/// 未配置附件目录时使用
#[derive(Debug, Clone, Default)]
pub struct NoOpAttachmentRelocator;

impl AttachmentRelocator for NoOpAttachmentRelocator {
    fn relocate(&self, _discussion: &Discussion, _from_forum_id: i64, _to_forum_id: i64) -> bool {
        true
    }
}
