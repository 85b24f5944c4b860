//! 配置加载
//!
//! 全局配置和 job 级覆盖都在一个 JSON 文件里（默认
//! `~/.config/build-notifier/config.json`）。凭据还可以用环境变量
//! `ZULIP_URL` / `ZULIP_EMAIL` / `ZULIP_API_KEY` 覆盖。
//!
//! 加载结果是不可变快照，每次通知流程只读。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::build::JobInfo;
use crate::notification::channels::zulip::{ZulipConfig, DEFAULT_TIMEOUT_SECS};
use crate::notification::destination::{is_value_set, DestinationConfig};
use crate::notification::policy::{SmartNotifyMode, SmartNotifyVariant};

pub const ENV_URL: &str = "ZULIP_URL";
pub const ENV_EMAIL: &str = "ZULIP_EMAIL";
pub const ENV_API_KEY: &str = "ZULIP_API_KEY";

/// 发送方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Zulip HTTP API
    #[default]
    Zulip,
    /// 写入本地发件箱文件
    LocalFile,
}

/// Job 级配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub stream: Option<String>,
    pub topic: Option<String>,
    /// `enabled` / `disabled` / 其他（跟随全局）
    pub smart_notification: Option<String>,
}

impl JobConfig {
    pub fn destination(&self) -> DestinationConfig {
        DestinationConfig {
            stream: self.stream.clone(),
            topic: self.topic.clone(),
        }
    }

    pub fn smart_notify_mode(&self) -> SmartNotifyMode {
        SmartNotifyMode::parse(self.smart_notification.as_deref())
    }
}

/// 全局配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Zulip 服务器地址
    pub url: String,
    /// Bot 邮箱
    pub email: String,
    /// Bot API key
    pub api_key: String,
    /// 默认 stream
    pub stream: Option<String>,
    /// 默认 topic（空则使用 job 名）
    pub topic: Option<String>,
    /// CI 根地址，用于生成链接
    pub link_base: Option<String>,
    /// 全局 smart notify 开关
    pub smart_notify: bool,
    pub smart_notify_variant: SmartNotifyVariant,
    /// 给每个提交作者发私信
    pub personal_notify: bool,
    /// 默认 topic 使用完整路径（`Folder » Job`）
    pub full_job_path_as_default_topic: bool,
    /// 消息中的项目名使用完整路径
    pub full_job_path_in_message: bool,
    /// HTTP 超时（秒）
    pub timeout_secs: u64,
    pub transport: Transport,
    /// 本地发件箱路径（transport = local_file 时使用）
    pub outbox_path: Option<PathBuf>,
    /// job 级覆盖，key 为 `Folder/Job` 形式的完整路径或 job 显示名
    pub jobs: BTreeMap<String, JobConfig>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            email: String::new(),
            api_key: String::new(),
            stream: None,
            topic: None,
            link_base: None,
            smart_notify: false,
            smart_notify_variant: SmartNotifyVariant::default(),
            personal_notify: false,
            full_job_path_as_default_topic: false,
            full_job_path_in_message: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            transport: Transport::default(),
            outbox_path: None,
            jobs: BTreeMap::new(),
        }
    }
}

impl NotifierConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("build-notifier")
            .join("config.json")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse notifier config")
    }

    /// 加载配置并应用环境变量覆盖
    ///
    /// 显式指定的路径必须存在；默认路径不存在时使用默认配置。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::read_file(&path)?
                } else {
                    debug!(path = %path.display(), "Config file not found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), jobs = config.jobs.len(), "Loaded config");
        Ok(config)
    }

    /// 用外部来源（通常是环境变量）覆盖凭据，空值忽略
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| is_value_set(Some(v.as_str()))) {
                *target = value;
            }
        };
        set(&mut self.url, ENV_URL);
        set(&mut self.email, ENV_EMAIL);
        set(&mut self.api_key, ENV_API_KEY);
    }

    pub fn global_destination(&self) -> DestinationConfig {
        DestinationConfig {
            stream: self.stream.clone(),
            topic: self.topic.clone(),
        }
    }

    /// 查找 job 级配置：先按完整路径，再按显示名，都没有则为空配置
    pub fn job_config(&self, job: &JobInfo) -> JobConfig {
        self.jobs
            .get(&job.config_key())
            .or_else(|| self.jobs.get(&job.display_name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn zulip_config(&self) -> ZulipConfig {
        ZulipConfig {
            url: self.url.clone(),
            email: self.email.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ItemRef;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = NotifierConfig::from_json("{}").unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.transport, Transport::Zulip);
        assert_eq!(config.smart_notify_variant, SmartNotifyVariant::SuccessStreak);
        assert!(!config.smart_notify);
        assert!(config.jobs.is_empty());
    }

    #[test]
    fn test_config_full() {
        let json = r#"{
            "url": "https://chat.example.com",
            "email": "jenkins-bot@zulip.com",
            "api_key": "secret",
            "stream": "defaultStream",
            "topic": "defaultTopic",
            "link_base": "https://ci.example.com",
            "smart_notify": true,
            "smart_notify_variant": "result_change",
            "personal_notify": true,
            "transport": "local_file",
            "jobs": {
                "Folder/TestJob": {"stream": "projectStream", "smart_notification": "disabled"}
            }
        }"#;
        let config = NotifierConfig::from_json(json).unwrap();
        assert_eq!(config.smart_notify_variant, SmartNotifyVariant::ResultChange);
        assert_eq!(config.transport, Transport::LocalFile);

        let job = JobInfo::new("TestJob").with_parent(ItemRef::new("Folder", "job/Folder"));
        let job_config = config.job_config(&job);
        assert_eq!(job_config.stream.as_deref(), Some("projectStream"));
        assert_eq!(job_config.smart_notify_mode(), SmartNotifyMode::Disabled);
    }

    #[test]
    fn test_job_config_falls_back_to_display_name() {
        let mut config = NotifierConfig::default();
        config.jobs.insert(
            "TestJob".to_string(),
            JobConfig {
                topic: Some("projectTopic".to_string()),
                ..Default::default()
            },
        );
        let job = JobInfo::new("TestJob").with_parent(ItemRef::new("Folder", ""));
        assert_eq!(config.job_config(&job).topic.as_deref(), Some("projectTopic"));
        assert_eq!(config.job_config(&JobInfo::new("Other")), JobConfig::default());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = NotifierConfig {
            url: "https://file.example.com".to_string(),
            email: "file-bot@example.com".to_string(),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [(ENV_API_KEY, "from-env"), (ENV_EMAIL, "")].into();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_key, "from-env");
        // 空值不覆盖
        assert_eq!(config.email, "file-bot@example.com");
        assert_eq!(config.url, "https://file.example.com");
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = NotifierConfig::load(Some(dir.path().join("missing.json").as_path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"stream": "builds", "timeout_secs": 5}"#).unwrap();

        let config = NotifierConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.stream.as_deref(), Some("builds"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.zulip_config().timeout_secs, 5);
    }
}
