//! 提示记录服务 - 业务能力层
//!
//! 只负责"记下一条用户可见的提示"，不关心流程。
//! 提示会保留在内存中，并追加写入 notices.txt。

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// 提示类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// 补题失败，题库少一题
    ReplenishmentShortfall,
    /// 导出时跳过了某页
    PageSkipped,
    /// 快照损坏，回退到默认值
    SnapshotFallback,
    /// 组卷模板缺题
    AllocationShortage,
}

impl NoticeKind {
    fn tag(self) -> &'static str {
        match self {
            NoticeKind::ReplenishmentShortfall => "补题",
            NoticeKind::PageSkipped => "导出",
            NoticeKind::SnapshotFallback => "快照",
            NoticeKind::AllocationShortage => "组卷",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Local>,
}

/// 提示记录服务
///
/// 职责：
/// - 记录被吞下的失败（不会中断流程的那些）
/// - 写文件失败只打日志，从不向上传播
pub struct NoticeWriter {
    file_path: Option<PathBuf>,
    notices: Mutex<Vec<Notice>>,
}

impl NoticeWriter {
    /// 写入默认的 notices.txt
    pub fn new() -> Self {
        Self::with_path("notices.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// 只保存在内存中
    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice {
            kind,
            message: message.into(),
            at: Local::now(),
        };
        debug!("记录提示: [{}] {}", kind.tag(), notice.message);

        if let Some(path) = &self.file_path {
            let line = format!(
                "{} | {} | {}\n",
                notice.at.format("%Y-%m-%d %H:%M:%S"),
                kind.tag(),
                notice.message
            );
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(line.as_bytes()));
            if let Err(e) = written {
                warn!("写入 {} 失败: {}", path.display(), e);
            }
        }

        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn count_of(&self, kind: NoticeKind) -> usize {
        self.notices
            .lock()
            .map(|n| n.iter().filter(|notice| notice.kind == kind).count())
            .unwrap_or(0)
    }
}

impl Default for NoticeWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_are_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notices.txt");

        let writer = NoticeWriter::with_path(&path);
        writer.record(NoticeKind::PageSkipped, "第 2 页截图失败");
        writer.record(NoticeKind::ReplenishmentShortfall, "补题 #1 失败");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("第 2 页截图失败"));
        assert_eq!(writer.count_of(NoticeKind::PageSkipped), 1);
    }

    #[test]
    fn test_in_memory_writer_keeps_order() {
        let writer = NoticeWriter::in_memory();
        writer.record(NoticeKind::SnapshotFallback, "a");
        writer.record(NoticeKind::AllocationShortage, "b");
        let messages: Vec<String> = writer.notices().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }
}
