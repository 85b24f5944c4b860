//! 变更集适配器 - 把不同形态的运行变更历史统一成提交记录列表
//!
//! 经典构建只有一份变更日志，pipeline 运行每个 checkout 步骤各有一份。
//! 适配器只依赖 `ChangeHistory` trait，不关心具体是哪一种。

mod email;

pub use email::{extract_email, resolve_author_email};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::NotifyResult;

/// 提交信息最大长度（字符数，含省略号）
pub const MAX_MESSAGE_CHARS: usize = 47;

/// 变更作者
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeAuthor {
    /// 源系统里的作者 ID（git 用邮箱作为 ID）
    #[serde(default)]
    pub id: Option<String>,
    /// 显示名
    #[serde(default)]
    pub display_name: String,
}

/// 变更日志中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub author: ChangeAuthor,
    #[serde(default, alias = "msg")]
    pub message: String,
}

impl ChangeEntry {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: ChangeAuthor {
                id: None,
                display_name: author.into(),
            },
            message: message.into(),
        }
    }

    pub fn with_author_id(mut self, id: impl Into<String>) -> Self {
        self.author.id = Some(id.into());
        self
    }
}

/// 一段变更日志（一次 checkout 的结果）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    /// SCM 类型（git / hg / svn），仅用于日志
    #[serde(default)]
    pub scm: Option<String>,
    #[serde(default)]
    pub entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new(entries: Vec<ChangeEntry>) -> Self {
        Self { scm: None, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 变更历史来源
pub trait ChangeHistory {
    /// 变更是否已经计算完成（不支持变更跟踪的运行类型视为已完成）
    fn is_computed(&self) -> bool;

    /// 按顺序返回所有变更日志段，读取失败时返回错误
    fn segments(&self) -> NotifyResult<Vec<&ChangeLog>>;

    /// 至少一个日志段包含至少一条记录
    fn has_changes(&self) -> NotifyResult<bool> {
        Ok(self.segments()?.iter().any(|log| !log.is_empty()))
    }
}

/// 运行的变更历史（宿主事件中的形态）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunChangeHistory {
    /// 经典构建：单份变更日志，可能尚未计算
    Classic {
        #[serde(default = "default_computed")]
        computed: bool,
        #[serde(default)]
        change_set: ChangeLog,
    },
    /// Pipeline 运行：每个 checkout 一段
    Pipeline {
        #[serde(default)]
        change_sets: Vec<ChangeLog>,
    },
    /// 不支持变更跟踪的运行类型
    #[default]
    Untracked,
}

fn default_computed() -> bool {
    true
}

impl ChangeHistory for RunChangeHistory {
    fn is_computed(&self) -> bool {
        match self {
            RunChangeHistory::Classic { computed, .. } => *computed,
            RunChangeHistory::Pipeline { .. } | RunChangeHistory::Untracked => true,
        }
    }

    fn segments(&self) -> NotifyResult<Vec<&ChangeLog>> {
        Ok(match self {
            RunChangeHistory::Classic { change_set, .. } => vec![change_set],
            RunChangeHistory::Pipeline { change_sets } => change_sets.iter().collect(),
            RunChangeHistory::Untracked => Vec::new(),
        })
    }
}

/// 提交记录（规范化后的变更）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author: String,
    pub author_email: Option<String>,
    /// 已去除首尾空白并截断
    pub message: String,
}

impl CommitRecord {
    pub fn from_entry(entry: &ChangeEntry) -> Self {
        let author = if entry.author.display_name.trim().is_empty() {
            entry.author.id.clone().unwrap_or_default()
        } else {
            entry.author.display_name.clone()
        };

        Self {
            author,
            author_email: resolve_author_email(&entry.author),
            message: truncate_message(&entry.message),
        }
    }
}

/// 去除首尾空白，超过 47 个字符时截为前 46 个字符加 `...`
pub fn truncate_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() <= MAX_MESSAGE_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    format!("{}...", head)
}

/// 提取本次构建的变更
///
/// - `None`: 变更尚未计算，或读取变更历史失败（已记录日志）
/// - `Some(vec![])`: 已计算，没有变更
/// - 否则按日志段顺序拼接，每段保持原有顺序
pub fn extract_changes<H>(history: &H) -> Option<Vec<CommitRecord>>
where
    H: ChangeHistory + ?Sized,
{
    if !history.is_computed() {
        debug!("Change set not computed yet");
        return None;
    }

    let segments = match history.segments() {
        Ok(segments) => segments,
        Err(e) => {
            warn!(error = %e, "Exception while computing changes since the last build");
            return None;
        }
    };

    let mut records = Vec::new();
    for log in segments {
        debug!(
            scm = log.scm.as_deref().unwrap_or("unknown"),
            entries = log.entries.len(),
            "Reading change log segment"
        );
        records.extend(log.entries.iter().map(CommitRecord::from_entry));
    }
    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;

    fn entry(author: &str, message: &str) -> ChangeEntry {
        ChangeEntry::new(author, message)
    }

    /// 读取时总是失败的变更历史
    struct BrokenHistory;

    impl ChangeHistory for BrokenHistory {
        fn is_computed(&self) -> bool {
            true
        }

        fn segments(&self) -> NotifyResult<Vec<&ChangeLog>> {
            Err(NotifyError::ChangeHistoryUnavailable(
                "changelog.xml is corrupt".to_string(),
            ))
        }
    }

    #[test]
    fn test_truncate_message() {
        let fifty = "a".repeat(50);
        let truncated = truncate_message(&fifty);
        assert_eq!(truncated, format!("{}...", "a".repeat(46)));
        assert_eq!(truncated.chars().count(), 49);

        let exact = "b".repeat(47);
        assert_eq!(truncate_message(&exact), exact);
        assert_eq!(truncate_message("  Short Commit Msg \n"), "Short Commit Msg");
    }

    #[test]
    fn test_truncate_message_counts_chars() {
        let msg = "修".repeat(48);
        assert_eq!(truncate_message(&msg), format!("{}...", "修".repeat(46)));
    }

    #[test]
    fn test_truncate_long_commit_message() {
        assert_eq!(
            truncate_message(
                "This is a very long commit message that will get truncated in the Zulip message"
            ),
            "This is a very long commit message that will g..."
        );
    }

    #[test]
    fn test_extract_pipeline_segments_in_order() {
        let history = RunChangeHistory::Pipeline {
            change_sets: vec![
                ChangeLog::new(vec![entry("A", "first"), entry("B", "second")]),
                ChangeLog::new(vec![entry("C", "third")]),
            ],
        };
        let changes = extract_changes(&history).unwrap();
        let authors: Vec<&str> = changes.iter().map(|c| c.author.as_str()).collect();
        assert_eq!(authors, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_extract_classic_not_computed() {
        let history = RunChangeHistory::Classic {
            computed: false,
            change_set: ChangeLog::new(vec![entry("A", "first")]),
        };
        assert!(extract_changes(&history).is_none());
    }

    #[test]
    fn test_extract_classic_empty() {
        let history = RunChangeHistory::Classic {
            computed: true,
            change_set: ChangeLog::default(),
        };
        assert_eq!(extract_changes(&history), Some(Vec::new()));
        assert!(!history.has_changes().unwrap());
    }

    #[test]
    fn test_extract_untracked_is_empty() {
        assert_eq!(extract_changes(&RunChangeHistory::Untracked), Some(Vec::new()));
    }

    #[test]
    fn test_has_changes_any_segment() {
        let history = RunChangeHistory::Pipeline {
            change_sets: vec![
                ChangeLog::default(),
                ChangeLog::new(vec![entry("C", "third")]),
            ],
        };
        assert!(history.has_changes().unwrap());
    }

    #[test]
    fn test_extract_failure_is_not_propagated() {
        assert!(extract_changes(&BrokenHistory).is_none());
    }

    #[test]
    fn test_commit_record_email_and_fallback_author() {
        let record = CommitRecord::from_entry(
            &ChangeEntry::new("", "fix build").with_author_id("Dev@Example.com"),
        );
        assert_eq!(record.author, "Dev@Example.com");
        assert_eq!(record.author_email, Some("dev@example.com".to_string()));
    }

    #[test]
    fn test_history_from_json() {
        let json = r#"{
            "kind": "pipeline",
            "change_sets": [
                {"scm": "git", "entries": [
                    {"author": {"id": "a@example.com", "display_name": "Alice"}, "msg": "one"}
                ]}
            ]
        }"#;
        let history: RunChangeHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.segments().unwrap()[0].scm.as_deref(), Some("git"));
        let changes = extract_changes(&history).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].message, "one");
        assert_eq!(changes[0].author_email.as_deref(), Some("a@example.com"));

        let classic: RunChangeHistory =
            serde_json::from_str(r#"{"kind": "classic", "computed": false}"#).unwrap();
        assert!(!classic.is_computed());
    }
}
