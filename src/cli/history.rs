//! History 命令 - 查看本地发件箱中最近的消息

use anyhow::Result;
use clap::Args;
use std::path::Path;

use super::output::format_output;
use crate::config::NotifierConfig;
use crate::notification::channel::truncate_for_log;
use crate::notification::store::OutboxStore;

/// History 命令参数
#[derive(Args)]
pub struct HistoryArgs {
    /// 显示最近 N 条消息
    #[arg(long, short, default_value = "10")]
    pub limit: usize,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 history 命令
pub fn handle_history(args: HistoryArgs, config_path: Option<&Path>) -> Result<()> {
    let config = NotifierConfig::load(config_path)?;
    let store = OutboxStore::new(
        config
            .outbox_path
            .clone()
            .unwrap_or_else(OutboxStore::default_path),
    );
    let records = store.read_recent(args.limit);

    if args.json {
        println!("{}", format_output(&records));
        return Ok(());
    }

    if records.is_empty() {
        println!("No messages in {}", store.path().display());
        return Ok(());
    }
    for record in &records {
        let first_line = record.content.lines().next().unwrap_or_default();
        println!(
            "{}  {}  {}",
            record.ts.format("%Y-%m-%d %H:%M:%S"),
            record.destination,
            truncate_for_log(first_line, 80)
        );
    }
    Ok(())
}
