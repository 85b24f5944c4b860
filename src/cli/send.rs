//! Send 命令 - 发送任意消息

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;

use super::output::{format_delivery, format_output};
use crate::build::JobInfo;
use crate::config::NotifierConfig;
use crate::notification::{BuildNotifier, NotificationBuilder};

/// Send 命令参数
#[derive(Args)]
pub struct SendArgs {
    /// 目标 stream（默认使用 job / 全局配置）
    #[arg(long)]
    pub stream: Option<String>,

    /// 目标 topic（默认使用全局 topic，其次 job 名）
    #[arg(long)]
    pub topic: Option<String>,

    /// 消息内容，`$VAR` / `${VAR}` 按当前环境变量展开
    #[arg(long, short)]
    pub message: String,

    /// Job 路径，例如 `Folder/TestJob`，用于查找 job 配置和默认 topic
    #[arg(long, default_value = "")]
    pub job: String,

    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 send 命令
pub fn handle_send(args: SendArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(NotifierConfig::load(config_path)?);
    let job = JobInfo::from_path(&args.job);

    let dispatcher = NotificationBuilder::from_config(&config)
        .dry_run(args.dry_run)
        .build()?;
    let mut job_config = config.job_config(&job);
    // 命令行给出的 stream 可以单独满足 stream 配置
    if job_config.stream.is_none() {
        job_config.stream = args.stream.clone();
    }
    let notifier = BuildNotifier::new(config, job_config, dispatcher)?;

    let delivery = notifier
        .send_message(
            &job,
            args.stream.as_deref(),
            args.topic.as_deref(),
            &args.message,
            &std::env::vars().collect(),
        )
        .context("Failed to resolve message destination")?;

    if args.json {
        println!("{}", format_output(&delivery));
    } else {
        println!("{}", format_delivery(&delivery));
    }
    Ok(())
}
