//! 消息组装 - 把构建结果、变更列表拼成 Zulip markdown 文本
//!
//! 输出格式（各部分按顺序）：
//! 1. `Project: <job> : `（仅 topic 为固定值时）
//! 2. `Build #N`，配置了链接根地址时渲染为 `[Build #N](<base><url>)`
//! 3. `: **RESULT**` + 状态 emoji
//! 4. 变更摘要
//!
//! 纯函数：相同输入总是得到逐字节相同的输出。

use crate::build::{BuildOutcome, BuildResult, JobInfo, PATH_SEPARATOR};
use crate::changes::CommitRecord;

pub const SUCCESS_GLYPH: &str = ":check_mark:";
pub const UNSTABLE_GLYPH: &str = ":warning:";
pub const FAILURE_GLYPH: &str = ":cross_mark:";

pub const NO_CHANGES_INFO: &str = "Could not determine changes since last build.";
pub const CHANGES_HEADER: &str = "Changes since last build:";

/// 链接根地址规范化：去掉空白，保证以且仅以一个 `/` 结尾；空值返回 None
pub fn normalize_link_base(base: Option<&str>) -> Option<String> {
    let base = base?.trim();
    if base.is_empty() {
        return None;
    }
    Some(format!("{}/", base.trim_end_matches('/')))
}

/// 消息组装器
#[derive(Debug, Clone, Default)]
pub struct MessageComposer {
    link_base: Option<String>,
    full_path_in_message: bool,
}

impl MessageComposer {
    pub fn new(link_base: Option<&str>) -> Self {
        Self {
            link_base: normalize_link_base(link_base),
            full_path_in_message: false,
        }
    }

    /// 项目名使用完整路径（`Folder » Job`）
    pub fn with_full_path(mut self, full_path: bool) -> Self {
        self.full_path_in_message = full_path;
        self
    }

    fn link(&self, label: &str, url: &str) -> String {
        match &self.link_base {
            Some(base) => format!("[{}]({}{})", label, base, url.trim_start_matches('/')),
            None => label.to_string(),
        }
    }

    /// 项目名（可选完整路径，每一级单独加链接）
    pub fn project_label(&self, job: &JobInfo) -> String {
        if self.full_path_in_message {
            job.path_items()
                .iter()
                .map(|item| self.link(&item.display_name, &item.url))
                .collect::<Vec<_>>()
                .join(PATH_SEPARATOR)
        } else {
            self.link(&job.display_name, &job.url)
        }
    }

    /// 状态行：`Build #N: **RESULT** <emoji>`
    pub fn status_line(&self, outcome: &BuildOutcome) -> String {
        let build_label = format!("Build {}", outcome.display_id);
        let mut line = format!(
            "{}: **{}**",
            self.link(&build_label, &outcome.url),
            outcome.result
        );

        match &outcome.result {
            BuildResult::Success => {
                line.push(' ');
                line.push_str(SUCCESS_GLYPH);
            }
            BuildResult::Unstable => {
                let failed = outcome
                    .failed_test_count
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string());
                line.push_str(&format!(" {} ({} broken tests)", UNSTABLE_GLYPH, failed));
            }
            _ => {
                line.push(' ');
                line.push_str(FAILURE_GLYPH);
            }
        }
        line
    }

    /// 组装完整消息
    ///
    /// `project` 为 Some 时在开头加项目名（topic 是固定值，消息里需要区分项目）。
    pub fn compose(
        &self,
        outcome: &BuildOutcome,
        changes: Option<&[CommitRecord]>,
        project: Option<&JobInfo>,
    ) -> String {
        let mut message = String::new();

        if let Some(job) = project {
            message.push_str("Project: ");
            message.push_str(&self.project_label(job));
            message.push_str(" : ");
        }

        message.push_str(&self.status_line(outcome));

        let summary = change_summary(changes);
        if !summary.is_empty() {
            message.push_str("\n\n");
            message.push_str(&summary);
        }

        message
    }
}

/// 变更摘要；没有变更时为空字符串
pub fn change_summary(changes: Option<&[CommitRecord]>) -> String {
    match changes {
        None => NO_CHANGES_INFO.to_string(),
        Some([]) => String::new(),
        Some(records) => {
            let mut summary = format!("{}\n", CHANGES_HEADER);
            for record in records {
                summary.push_str(&format!("\n* `{}` {}", record.author, record.message));
            }
            summary
        }
    }
}
