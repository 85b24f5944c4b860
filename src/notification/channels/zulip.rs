//! Zulip 渠道 - 通过 `messages` API 发送 stream 消息和私信
//!
//! 表单编码 POST，HTTP Basic 认证（`email:api_key`）。

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::notification::channel::{Destination, MessageSender, OutboundMessage, SendResult};

/// 未配置服务器地址时使用的 API 根地址
pub const DEFAULT_API_ENDPOINT: &str = "https://api.zulip.com/v1/";

/// 默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("build-notifier/", env!("CARGO_PKG_VERSION"));

/// Zulip 渠道配置
#[derive(Debug, Clone)]
pub struct ZulipConfig {
    /// 服务器地址，例如 `https://chat.example.com`（空则使用默认 API 地址）
    pub url: String,
    /// Bot 邮箱
    pub email: String,
    /// Bot API key
    pub api_key: String,
    /// 超时时间 (秒)
    pub timeout_secs: u64,
}

impl Default for ZulipConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            email: String::new(),
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// API 响应
#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(default)]
    msg: String,
}

/// Zulip 渠道
#[derive(Debug)]
pub struct ZulipChannel {
    client: Client,
    config: ZulipConfig,
}

impl ZulipChannel {
    pub fn new(config: ZulipConfig) -> Result<Self> {
        if config.email.trim().is_empty() {
            return Err(anyhow!("Zulip bot email is required"));
        }
        if config.api_key.trim().is_empty() {
            return Err(anyhow!("Zulip API key is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    /// API 方法的完整地址
    pub fn api_endpoint(&self, method: &str) -> String {
        let url = self.config.url.trim();
        if url.is_empty() {
            format!("{}{}", DEFAULT_API_ENDPOINT, method)
        } else {
            format!("{}/api/v1/{}", url.trim_end_matches('/'), method)
        }
    }

    /// 表单参数
    fn form_params(message: &OutboundMessage) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("type", message.destination.kind().to_string()),
            ("to", message.destination.target().to_string()),
        ];
        if let Destination::Stream { topic, .. } = &message.destination {
            params.push(("subject", topic.clone()));
        }
        params.push(("content", message.content.clone()));
        params
    }
}

impl MessageSender for ZulipChannel {
    fn name(&self) -> &str {
        "zulip"
    }

    fn send(&self, message: &OutboundMessage) -> Result<SendResult> {
        let url = self.api_endpoint("messages");
        debug!(url = %url, destination = %message.destination, "Posting Zulip message");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_key))
            .form(&Self::form_params(message))
            .send()
            .with_context(|| format!("HTTP request to {} failed", url))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| anyhow!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Ok(SendResult::Failed(format!("HTTP {}: {}", status, body)));
        }

        // 200 但 result=error 也算失败
        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(api) if api.result != "success" => Ok(SendResult::Failed(api.msg)),
            _ => Ok(SendResult::Sent),
        }
    }
}
