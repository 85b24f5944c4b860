//! Build Notifier - 构建完成后向 Zulip 发送通知

pub mod build;
pub mod changes;
pub mod cli;
pub mod config;
pub mod error;
pub mod expand;
pub mod notification;

pub use build::{BuildEvent, BuildOutcome, BuildResult, ItemRef, JobInfo};
pub use changes::{extract_changes, ChangeHistory, CommitRecord, RunChangeHistory};
pub use config::{JobConfig, NotifierConfig, Transport};
pub use error::{NotifyError, NotifyResult};
pub use notification::{
    BuildNotifier, Destination, MessageSender, NotificationBuilder, NotificationDispatcher,
    NotificationReport, OutboundMessage, SendResult,
};
