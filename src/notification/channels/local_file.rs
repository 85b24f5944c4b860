//! 本地文件渠道 - 把消息写入 JSONL 发件箱而不是发到聊天服务

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use crate::notification::channel::{MessageSender, OutboundMessage, SendResult};
use crate::notification::store::{OutboxRecord, OutboxStore};

/// 本地文件渠道
pub struct LocalFileChannel {
    store: OutboxStore,
}

impl LocalFileChannel {
    pub fn new(store: OutboxStore) -> Self {
        Self { store }
    }
}

impl MessageSender for LocalFileChannel {
    fn name(&self) -> &str {
        "local_file"
    }

    fn send(&self, message: &OutboundMessage) -> Result<SendResult> {
        let record = OutboxRecord {
            ts: Utc::now(),
            destination: message.destination.clone(),
            content: message.content.clone(),
        };

        match self.store.append(&record) {
            Ok(()) => {
                debug!(
                    channel = "local_file",
                    path = %self.store.path().display(),
                    "Message recorded to outbox"
                );
                Ok(SendResult::Sent)
            }
            Err(e) => {
                warn!(channel = "local_file", error = %e, "Failed to write message to outbox");
                Ok(SendResult::Failed(e.to_string()))
            }
        }
    }
}
