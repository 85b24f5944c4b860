//! 目标解析 - stream/topic 的分层配置
//!
//! 优先级：运行级覆盖 → job 配置 → 全局默认 →（仅 topic）结构性回退。
//! 每一层都是 `FallbackChain` 上的一个提供者，从左到右取第一个非空值。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};

/// 非空（去除空白后）才算已设置
pub fn is_value_set(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// 单层 stream/topic 配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl DestinationConfig {
    pub fn new(stream: Option<&str>, topic: Option<&str>) -> Self {
        Self {
            stream: stream.map(|s| s.to_string()),
            topic: topic.map(|s| s.to_string()),
        }
    }
}

type Provider<'a> = Box<dyn FnOnce() -> Option<String> + 'a>;

/// 有序的可选值提供者列表
pub struct FallbackChain<'a> {
    layers: Vec<(&'static str, Provider<'a>)>,
}

impl<'a> FallbackChain<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// 追加一个固定值层
    pub fn then(mut self, name: &'static str, value: Option<&'a str>) -> Self {
        self.layers
            .push((name, Box::new(move || value.map(|v| v.to_string()))));
        self
    }

    /// 追加一个惰性计算的层（只在前面各层都为空时调用）
    pub fn then_with(mut self, name: &'static str, f: impl FnOnce() -> String + 'a) -> Self {
        self.layers.push((name, Box::new(move || Some(f()))));
        self
    }

    /// 返回第一个非空值及其来源层名
    pub fn resolve(self) -> Option<(String, &'static str)> {
        for (name, provider) in self.layers {
            if let Some(value) = provider() {
                if is_value_set(Some(&value)) {
                    return Some((value, name));
                }
            }
        }
        None
    }
}

impl Default for FallbackChain<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析后的目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub stream: String,
    pub topic: String,
    /// topic 来自 job/全局配置（而不是从 job 名推导），此时消息里要带项目名
    pub fixed_topic: bool,
}

/// 解析 stream：运行级 → job → 全局，都为空则是配置错误
pub fn resolve_stream(
    run: &DestinationConfig,
    job: &DestinationConfig,
    global: &DestinationConfig,
) -> NotifyResult<String> {
    FallbackChain::new()
        .then("run", run.stream.as_deref())
        .then("job", job.stream.as_deref())
        .then("global", global.stream.as_deref())
        .resolve()
        .map(|(stream, source)| {
            debug!(stream = %stream, source, "Resolved stream");
            stream
        })
        .ok_or_else(|| {
            NotifyError::Configuration(
                "stream is blank in run, job and global configuration".to_string(),
            )
        })
}

/// 解析完整目标
///
/// `fallback_topic` 只在三层配置都没有 topic 时调用（job 显示名或完整路径）。
pub fn resolve_destination(
    run: &DestinationConfig,
    job: &DestinationConfig,
    global: &DestinationConfig,
    fallback_topic: impl FnOnce() -> String,
) -> NotifyResult<ResolvedDestination> {
    let stream = resolve_stream(run, job, global)?;

    let fixed_topic = is_value_set(job.topic.as_deref()) || is_value_set(global.topic.as_deref());

    let (topic, source) = FallbackChain::new()
        .then("run", run.topic.as_deref())
        .then("job", job.topic.as_deref())
        .then("global", global.topic.as_deref())
        .then_with("fallback", fallback_topic)
        .resolve()
        .ok_or_else(|| {
            NotifyError::Configuration("topic resolved to a blank value".to_string())
        })?;
    debug!(topic = %topic, source, fixed_topic, "Resolved topic");

    Ok(ResolvedDestination {
        stream,
        topic,
        fixed_topic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(stream: Option<&str>, topic: Option<&str>) -> DestinationConfig {
        DestinationConfig::new(stream, topic)
    }

    #[test]
    fn test_is_value_set() {
        assert!(is_value_set(Some("Test")));
        assert!(!is_value_set(Some("")));
        assert!(!is_value_set(Some("  ")));
        assert!(!is_value_set(None));
    }

    #[test]
    fn test_chain_first_non_blank_wins() {
        let resolved = FallbackChain::new()
            .then("a", None)
            .then("b", Some(""))
            .then("c", Some("value"))
            .then("d", Some("later"))
            .resolve();
        assert_eq!(resolved, Some(("value".to_string(), "c")));
    }

    #[test]
    fn test_chain_lazy_layer_not_called_when_earlier_set() {
        let mut called = false;
        let resolved = FallbackChain::new()
            .then("a", Some("x"))
            .then_with("b", || {
                called = true;
                "y".to_string()
            })
            .resolve();
        assert_eq!(resolved.unwrap().0, "x");
        assert!(!called);
    }

    #[test]
    fn test_topic_from_global() {
        let resolved = resolve_destination(
            &cfg(None, Some("")),
            &cfg(None, Some("")),
            &cfg(Some("builds"), Some("releases")),
            || "MyJob".to_string(),
        )
        .unwrap();
        assert_eq!(resolved.topic, "releases");
        assert!(resolved.fixed_topic);
    }

    #[test]
    fn test_topic_structural_fallback() {
        let resolved = resolve_destination(
            &cfg(None, Some("")),
            &cfg(None, Some("")),
            &cfg(Some("builds"), Some("")),
            || "MyJob".to_string(),
        )
        .unwrap();
        assert_eq!(resolved.topic, "MyJob");
        assert!(!resolved.fixed_topic);
    }

    #[test]
    fn test_run_override_wins() {
        let resolved = resolve_destination(
            &cfg(Some("hotfix"), Some("deploys")),
            &cfg(Some("projectStream"), Some("projectTopic")),
            &cfg(Some("defaultStream"), Some("defaultTopic")),
            || "TestJob".to_string(),
        )
        .unwrap();
        assert_eq!(resolved.stream, "hotfix");
        assert_eq!(resolved.topic, "deploys");
        assert!(resolved.fixed_topic);
    }

    #[test]
    fn test_run_topic_does_not_make_topic_fixed() {
        let resolved = resolve_destination(
            &cfg(None, Some("deploys")),
            &DestinationConfig::default(),
            &cfg(Some("builds"), None),
            || "TestJob".to_string(),
        )
        .unwrap();
        assert_eq!(resolved.topic, "deploys");
        assert!(!resolved.fixed_topic);
    }

    #[test]
    fn test_job_config_over_global() {
        let resolved = resolve_destination(
            &DestinationConfig::default(),
            &cfg(Some("projectStream"), Some("projectTopic")),
            &cfg(Some("defaultStream"), Some("defaultTopic")),
            || "TestJob".to_string(),
        )
        .unwrap();
        assert_eq!(resolved.stream, "projectStream");
        assert_eq!(resolved.topic, "projectTopic");
    }

    #[test]
    fn test_blank_stream_is_configuration_error() {
        let err = resolve_destination(
            &cfg(Some(" "), None),
            &cfg(Some(""), None),
            &cfg(None, None),
            || "TestJob".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }

    #[test]
    fn test_blank_fallback_topic_is_configuration_error() {
        let err = resolve_destination(
            &DestinationConfig::default(),
            &DestinationConfig::default(),
            &cfg(Some("builds"), None),
            String::new,
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }
}
