//! 消息发送 trait 定义

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 消息目标
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// stream 消息（带 topic）
    Stream { stream: String, topic: String },
    /// 私信（按邮箱）
    Private { to: String },
}

impl Destination {
    pub fn stream(stream: impl Into<String>, topic: impl Into<String>) -> Self {
        Destination::Stream {
            stream: stream.into(),
            topic: topic.into(),
        }
    }

    pub fn private(to: impl Into<String>) -> Self {
        Destination::Private { to: to.into() }
    }

    /// API 中的消息类型
    pub fn kind(&self) -> &'static str {
        match self {
            Destination::Stream { .. } => "stream",
            Destination::Private { .. } => "private",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Destination::Stream { stream, .. } => stream,
            Destination::Private { to } => to,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            Destination::Stream { topic, .. } => Some(topic),
            Destination::Private { .. } => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stream { stream, topic } => write!(f, "stream:{} > {}", stream, topic),
            Destination::Private { to } => write!(f, "private:{}", to),
        }
    }
}

/// 待发送的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub destination: Destination,
    /// 消息内容（已格式化）
    pub content: String,
}

impl OutboundMessage {
    pub fn new(destination: Destination, content: impl Into<String>) -> Self {
        Self {
            destination,
            content: content.into(),
        }
    }
}

/// 发送结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（dry-run 等）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

impl SendResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendResult::Sent)
    }
}

/// 消息发送能力（HTTP API、本地文件等）
pub trait MessageSender: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 同步发送一条消息
    ///
    /// 传输层错误用 `Err` 返回，服务端拒绝用 `Ok(SendResult::Failed)` 返回。
    fn send(&self, message: &OutboundMessage) -> Result<SendResult>;
}

/// 截断日志中的消息内容
pub fn truncate_for_log(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let head: String = content.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
