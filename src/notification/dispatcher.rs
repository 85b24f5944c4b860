//! 通知分发器 - 逐个目标调用发送渠道
//!
//! 每次发送相互独立：一次失败只记录日志，不影响其余目标，也不会重试。

use super::channel::{truncate_for_log, MessageSender, OutboundMessage, SendResult};
use std::sync::Arc;
use tracing::{info, warn};

/// 失败日志中保留的消息长度
const LOG_BODY_CHARS: usize = 100;

/// 通知分发器
pub struct NotificationDispatcher {
    sender: Arc<dyn MessageSender>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self {
            sender,
            dry_run: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn sender_name(&self) -> &str {
        self.sender.name()
    }

    /// 发送单条消息，错误转换为 `SendResult::Failed`
    pub fn dispatch(&self, message: &OutboundMessage) -> SendResult {
        if self.dry_run {
            info!(
                channel = self.sender.name(),
                destination = %message.destination,
                content = %message.content,
                "[DRY-RUN] Would send message"
            );
            return SendResult::Skipped("dry-run".to_string());
        }

        let result = match self.sender.send(message) {
            Ok(result) => result,
            Err(e) => SendResult::Failed(format!("{:#}", e)),
        };

        match &result {
            SendResult::Sent => info!(
                channel = self.sender.name(),
                destination = %message.destination,
                "Message sent"
            ),
            SendResult::Skipped(reason) => info!(
                channel = self.sender.name(),
                destination = %message.destination,
                reason = %reason,
                "Message skipped"
            ),
            SendResult::Failed(error) => warn!(
                channel = self.sender.name(),
                destination = %message.destination,
                error = %error,
                body = %truncate_for_log(&message.content, LOG_BODY_CHARS),
                "Error sending message"
            ),
        }

        result
    }

    /// 依次发送所有消息，任何一条失败都不影响后续消息
    pub fn dispatch_all(&self, messages: &[OutboundMessage]) -> Vec<(OutboundMessage, SendResult)> {
        messages
            .iter()
            .map(|message| (message.clone(), self.dispatch(message)))
            .collect()
    }
}
