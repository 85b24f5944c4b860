//! Notify 命令 - 处理一次构建完成事件
//!
//! 事件 JSON 由 CI 宿主产生，可以从文件或 stdin 读取。投递失败不影响退出码，
//! 只有配置或输入错误会返回非零。

use anyhow::{bail, Context, Result};
use clap::Args;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::output::{format_output, format_report};
use crate::build::BuildEvent;
use crate::config::NotifierConfig;
use crate::notification::{BuildNotifier, NotificationBuilder};

/// Notify 命令参数
#[derive(Args)]
pub struct NotifyArgs {
    /// 事件 JSON 文件路径，`-` 表示从 stdin 读取
    #[arg(long)]
    pub event: String,

    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 读取事件 JSON
pub fn read_event(source: &str) -> Result<BuildEvent> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read event file {}", source))?
    };
    BuildEvent::from_json(&content)
}

/// 处理 notify 命令
pub fn handle_notify(args: NotifyArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(NotifierConfig::load(config_path)?);
    let event = read_event(&args.event)?;

    let dispatcher = NotificationBuilder::from_config(&config)
        .dry_run(args.dry_run)
        .build()?;
    let notifier = BuildNotifier::for_job(config, &event.job, dispatcher)
        .with_context(|| format!("Cannot notify for job '{}'", event.job.full_display_name()))?;

    let report = match notifier.try_on_build_complete(&event) {
        Ok(report) => report,
        Err(e) => bail!(
            "Cannot notify for job '{}': {}",
            event.job.full_display_name(),
            e
        ),
    };
    if args.json {
        println!("{}", format_output(&report));
    } else {
        println!("{}", format_report(&report));
    }
    Ok(())
}
