//! 构建通知引擎
//!
//! 每个构建完成事件走一遍：策略判断 → 解析目标 → 提取变更 → 组装消息 → 分发。
//! 全程同步，配置是只读快照。

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::channel::{Destination, OutboundMessage, SendResult};
use super::composer::MessageComposer;
use super::destination::{
    is_value_set, resolve_destination, resolve_stream, DestinationConfig, FallbackChain,
};
use super::dispatcher::NotificationDispatcher;
use super::policy::should_notify;
use crate::build::{BuildEvent, JobInfo};
use crate::changes::{extract_changes, CommitRecord};
use crate::config::{JobConfig, NotifierConfig};
use crate::error::{NotifyError, NotifyResult};
use crate::expand::expand_variables;

/// 单个目标的投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub destination: Destination,
    pub result: SendResult,
}

/// 一次事件处理的汇总
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NotificationReport {
    /// 是否尝试了发送
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    pub deliveries: Vec<Delivery>,
}

impl NotificationReport {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            notified: false,
            skipped: Some(reason.into()),
            deliveries: Vec::new(),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_sent()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| matches!(d.result, SendResult::Failed(_)))
            .count()
    }
}

/// 构建通知器（每个 job 一个）
pub struct BuildNotifier {
    config: Arc<NotifierConfig>,
    job: JobConfig,
    composer: MessageComposer,
    dispatcher: NotificationDispatcher,
}

impl BuildNotifier {
    /// 创建通知器
    ///
    /// job 和全局配置的 stream 都为空时返回配置错误。
    pub fn new(
        config: Arc<NotifierConfig>,
        job: JobConfig,
        dispatcher: NotificationDispatcher,
    ) -> NotifyResult<Self> {
        resolve_stream(
            &DestinationConfig::default(),
            &job.destination(),
            &config.global_destination(),
        )?;

        let composer = MessageComposer::new(config.link_base.as_deref())
            .with_full_path(config.full_job_path_in_message);

        Ok(Self {
            config,
            job,
            composer,
            dispatcher,
        })
    }

    /// 按 job 在配置中查找 job 级覆盖后创建
    pub fn for_job(
        config: Arc<NotifierConfig>,
        job: &JobInfo,
        dispatcher: NotificationDispatcher,
    ) -> NotifyResult<Self> {
        let job_config = config.job_config(job);
        Self::new(config, job_config, dispatcher)
    }

    pub fn should_notify(&self, event: &BuildEvent) -> bool {
        should_notify(
            self.job.smart_notify_mode(),
            self.config.smart_notify,
            self.config.smart_notify_variant,
            &event.build.result,
            event.previous.as_ref().map(|p| &p.result),
        )
    }

    fn fallback_topic(&self, job: &JobInfo) -> String {
        if self.config.full_job_path_as_default_topic {
            job.full_display_name()
        } else {
            job.display_name.clone()
        }
    }

    /// 生成本次事件要发送的消息；策略判定不通知时返回 `None`
    pub fn prepare(&self, event: &BuildEvent) -> NotifyResult<Option<Vec<OutboundMessage>>> {
        if !self.should_notify(event) {
            return Ok(None);
        }

        let run = DestinationConfig {
            stream: event.stream.clone(),
            topic: event.topic.clone(),
        };
        let resolved = resolve_destination(
            &run,
            &self.job.destination(),
            &self.config.global_destination(),
            || self.fallback_topic(&event.job),
        )?;

        let stream = expand_variables(&resolved.stream, &event.environment);
        let topic = expand_variables(&resolved.topic, &event.environment);
        if !is_value_set(Some(stream.as_str())) {
            return Err(NotifyError::Configuration(format!(
                "stream '{}' expanded to a blank value",
                resolved.stream
            )));
        }
        if !is_value_set(Some(topic.as_str())) {
            return Err(NotifyError::Configuration(format!(
                "topic '{}' expanded to a blank value",
                resolved.topic
            )));
        }

        let changes = extract_changes(&event.changes);
        let project = resolved.fixed_topic.then_some(&event.job);
        let content = self
            .composer
            .compose(&event.build, changes.as_deref(), project);

        let mut messages = vec![OutboundMessage::new(
            Destination::stream(stream, topic),
            content.clone(),
        )];

        if self.config.personal_notify {
            if let Some(changes) = changes.as_deref() {
                messages.extend(
                    personal_recipients(changes)
                        .into_iter()
                        .map(|to| OutboundMessage::new(Destination::private(to), content.clone())),
                );
            }
        }

        Ok(Some(messages))
    }

    /// 处理构建完成事件
    ///
    /// 投递失败只记录在报告里；配置错误（stream/topic 解析或展开为空）返回 `Err`。
    pub fn try_on_build_complete(&self, event: &BuildEvent) -> NotifyResult<NotificationReport> {
        let Some(messages) = self.prepare(event)? else {
            debug!(
                job = %event.job.display_name,
                build = %event.build.display_id,
                result = %event.build.result,
                "Smart notification suppressed"
            );
            return Ok(NotificationReport::skipped("smart notification"));
        };

        let deliveries: Vec<Delivery> = self
            .dispatcher
            .dispatch_all(&messages)
            .into_iter()
            .map(|(message, result)| Delivery {
                destination: message.destination,
                result,
            })
            .collect();

        let report = NotificationReport {
            notified: true,
            skipped: None,
            deliveries,
        };
        info!(
            job = %event.job.display_name,
            build = %event.build.display_id,
            sent = report.sent_count(),
            failed = report.failed_count(),
            "Build notification processed"
        );
        Ok(report)
    }

    /// 同 `try_on_build_complete`，配置错误记录日志后返回跳过的报告
    pub fn on_build_complete(&self, event: &BuildEvent) -> NotificationReport {
        self.try_on_build_complete(event).unwrap_or_else(|e| {
            warn!(job = %event.job.display_name, error = %e, "Skipping notification");
            NotificationReport::skipped(e.to_string())
        })
    }

    /// 发送任意消息
    ///
    /// stream: 参数 → job → 全局；topic: 参数 → 全局 → job 名。
    /// 消息内容中的 `$VAR` / `${VAR}` 按 `env` 展开。
    pub fn send_message(
        &self,
        job: &JobInfo,
        stream: Option<&str>,
        topic: Option<&str>,
        message: &str,
        env: &BTreeMap<String, String>,
    ) -> NotifyResult<Delivery> {
        let run = DestinationConfig::new(stream, topic);
        let stream = resolve_stream(&run, &self.job.destination(), &self.config.global_destination())?;

        let (topic, source) = FallbackChain::new()
            .then("run", topic)
            .then("global", self.config.topic.as_deref())
            .then_with("job", || job.display_name.clone())
            .resolve()
            .ok_or_else(|| NotifyError::Configuration("topic resolved to a blank value".to_string()))?;
        debug!(topic = %topic, source, "Resolved topic for message");

        let content = expand_variables(message, env);
        let outbound = OutboundMessage::new(Destination::stream(stream, topic), content);
        let result = self.dispatcher.dispatch(&outbound);
        Ok(Delivery {
            destination: outbound.destination,
            result,
        })
    }
}

/// 去重后的提交作者邮箱，保持首次出现的顺序
fn personal_recipients(changes: &[CommitRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    changes
        .iter()
        .filter_map(|record| record.author_email.as_deref())
        .filter(|email| !email.trim().is_empty())
        .filter(|email| seen.insert(email.to_string()))
        .map(str::to_string)
        .collect()
}
