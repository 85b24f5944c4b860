//! 构建事件数据模型
//!
//! 宿主（CI 系统）每次构建结束时投递一个 `BuildEvent`，所有值都是
//! 构建结束那一刻的快照，只在一次通知流程中存活。

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::changes::RunChangeHistory;

/// 完整路径中各级名称之间的分隔符
pub const PATH_SEPARATOR: &str = " » ";

/// 构建结果
///
/// 没有结果（例如仍在运行的 pipeline）按 `Success` 处理。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildResult {
    #[default]
    Success,
    Unstable,
    Failure,
    /// 其他结果（ABORTED, NOT_BUILT ...），保留原名用于展示
    Other(String),
}

impl BuildResult {
    /// 解析结果名（大小写不敏感），空字符串视为 SUCCESS
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        match name.to_ascii_uppercase().as_str() {
            "" | "SUCCESS" => BuildResult::Success,
            "UNSTABLE" => BuildResult::Unstable,
            "FAILURE" => BuildResult::Failure,
            other => BuildResult::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::Other(name) => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for BuildResult {
    fn from(name: String) -> Self {
        BuildResult::parse(&name)
    }
}

impl From<BuildResult> for String {
    fn from(result: BuildResult) -> Self {
        result.as_str().to_string()
    }
}

/// `null` 或缺失的 result 字段按 SUCCESS 处理
fn result_or_success<'de, D>(deserializer: D) -> Result<BuildResult, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.map(BuildResult::from).unwrap_or_default())
}

/// 单次构建的结果快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// 展示用编号，例如 `#42`
    pub display_id: String,
    /// 相对于 CI 根地址的构建 URL
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "result_or_success")]
    pub result: BuildResult,
    /// 失败测试数（没有测试报告时为空）
    #[serde(default)]
    pub failed_test_count: Option<u32>,
}

impl BuildOutcome {
    pub fn new(display_id: impl Into<String>, result: BuildResult) -> Self {
        Self {
            display_id: display_id.into(),
            url: String::new(),
            result,
            failed_test_count: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_failed_tests(mut self, count: u32) -> Self {
        self.failed_test_count = Some(count);
        self
    }
}

/// 带链接的条目（job 或 folder）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemRef {
    pub display_name: String,
    #[serde(default)]
    pub url: String,
}

impl ItemRef {
    pub fn new(display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            url: url.into(),
        }
    }
}

/// Job 信息
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobInfo {
    pub display_name: String,
    #[serde(default)]
    pub url: String,
    /// 上级 folder，从最外层到最内层
    #[serde(default)]
    pub parents: Vec<ItemRef>,
}

impl JobInfo {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// 从 `Folder/TestJob` 形式的路径构造（没有链接）
    pub fn from_path(path: &str) -> Self {
        let mut names: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        let display_name = names.pop().unwrap_or_default();
        Self {
            display_name: display_name.to_string(),
            url: String::new(),
            parents: names.into_iter().map(|name| ItemRef::new(name, "")).collect(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_parent(mut self, parent: ItemRef) -> Self {
        self.parents.push(parent);
        self
    }

    /// 路径上的所有条目（上级 folder + job 自身），跳过空名称
    pub fn path_items(&self) -> Vec<ItemRef> {
        self.parents
            .iter()
            .cloned()
            .chain(std::iter::once(ItemRef::new(&self.display_name, &self.url)))
            .filter(|item| !item.display_name.is_empty())
            .collect()
    }

    /// 完整路径，例如 `Folder » TestJob`
    pub fn full_display_name(&self) -> String {
        self.path_items()
            .iter()
            .map(|item| item.display_name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// 查找 job 级配置用的 key，例如 `Folder/TestJob`
    pub fn config_key(&self) -> String {
        self.path_items()
            .iter()
            .map(|item| item.display_name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// 构建完成事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEvent {
    pub job: JobInfo,
    pub build: BuildOutcome,
    #[serde(default)]
    pub previous: Option<BuildOutcome>,
    #[serde(default)]
    pub changes: RunChangeHistory,
    /// 构建环境变量，用于展开 stream/topic 中的 `${VAR}`
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// 本次运行级别的 stream 覆盖
    #[serde(default)]
    pub stream: Option<String>,
    /// 本次运行级别的 topic 覆盖
    #[serde(default)]
    pub topic: Option<String>,
}

impl BuildEvent {
    pub fn new(job: JobInfo, build: BuildOutcome) -> Self {
        Self {
            job,
            build,
            previous: None,
            changes: RunChangeHistory::default(),
            environment: BTreeMap::new(),
            stream: None,
            topic: None,
        }
    }

    pub fn with_previous(mut self, previous: BuildOutcome) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn with_changes(mut self, changes: RunChangeHistory) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// 从 JSON 解析事件
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse build event JSON")
    }
}
