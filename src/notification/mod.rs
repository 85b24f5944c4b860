//! 通知层 - 构建完成后决定是否通知、发给谁、发什么
//!
//! # 组成
//! 1. `policy`：smart notify 策略（连续成功时保持安静）
//! 2. `destination`：stream/topic 按 运行 → job → 全局 的顺序解析
//! 3. `composer`：组装 Markdown 消息
//! 4. `dispatcher` + `channels`：逐条发送，单条失败不影响其他消息
//! 5. `notifier`：把以上串起来处理一次构建事件
//!
//! # 使用示例
//! ```ignore
//! use build_notifier::config::NotifierConfig;
//! use build_notifier::notification::{BuildNotifier, NotificationBuilder};
//!
//! let config = Arc::new(NotifierConfig::load(None)?);
//! let dispatcher = NotificationBuilder::from_config(&config).build()?;
//! let notifier = BuildNotifier::for_job(config, &event.job, dispatcher)?;
//! let report = notifier.on_build_complete(&event);
//! ```

pub mod builder;
pub mod channel;
pub mod channels;
pub mod composer;
pub mod destination;
pub mod dispatcher;
pub mod notifier;
pub mod policy;
pub mod store;

pub use builder::NotificationBuilder;
pub use channel::{Destination, MessageSender, OutboundMessage, SendResult};
pub use composer::MessageComposer;
pub use destination::{DestinationConfig, FallbackChain, ResolvedDestination};
pub use dispatcher::NotificationDispatcher;
pub use notifier::{BuildNotifier, Delivery, NotificationReport};
pub use policy::{should_notify, SmartNotifyMode, SmartNotifyVariant};
pub use store::{OutboxRecord, OutboxStore};
