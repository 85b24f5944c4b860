//! 分发器构建器 - 按配置选择发送渠道

use super::channel::MessageSender;
use super::channels::local_file::LocalFileChannel;
use super::channels::zulip::{ZulipChannel, ZulipConfig};
use super::dispatcher::NotificationDispatcher;
use super::store::OutboxStore;
use crate::config::{NotifierConfig, Transport};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 分发器构建器
pub struct NotificationBuilder {
    transport: Transport,
    zulip: ZulipConfig,
    outbox_path: Option<PathBuf>,
    dry_run: bool,
}

impl NotificationBuilder {
    pub fn new() -> Self {
        Self {
            transport: Transport::default(),
            zulip: ZulipConfig::default(),
            outbox_path: None,
            dry_run: false,
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self {
            transport: config.transport,
            zulip: config.zulip_config(),
            outbox_path: config.outbox_path.clone(),
            dry_run: false,
        }
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn outbox_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.outbox_path = Some(path.into());
        self
    }

    /// 设置 dry-run 模式
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 构建 NotificationDispatcher
    ///
    /// dry-run 时不需要凭据，Zulip 渠道缺少凭据会退回到本地文件渠道以便打印。
    pub fn build(self) -> Result<NotificationDispatcher> {
        let outbox = || {
            OutboxStore::new(
                self.outbox_path
                    .clone()
                    .unwrap_or_else(OutboxStore::default_path),
            )
        };

        let sender: Arc<dyn MessageSender> = match self.transport {
            Transport::Zulip => match ZulipChannel::new(self.zulip.clone()) {
                Ok(channel) => {
                    info!(channel = "zulip", url = %self.zulip.url, "Using Zulip channel");
                    Arc::new(channel)
                }
                Err(_) if self.dry_run => Arc::new(LocalFileChannel::new(outbox())),
                Err(e) => return Err(e),
            },
            Transport::LocalFile => {
                let store = outbox();
                info!(channel = "local_file", path = %store.path().display(), "Using local outbox");
                Arc::new(LocalFileChannel::new(store))
            }
        };

        Ok(NotificationDispatcher::new(sender).with_dry_run(self.dry_run))
    }
}

impl Default for NotificationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
