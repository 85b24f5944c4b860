//! Build Notifier CLI
//!
//! 构建完成后向 Zulip 发送通知

use anyhow::Result;
use build_notifier::cli::{
    handle_check_config, handle_history, handle_notify, handle_send, CheckConfigArgs, HistoryArgs,
    NotifyArgs, SendArgs,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "bnotify")]
#[command(about = "Build Notifier - 构建完成后向 Zulip 发送通知")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/build-notifier/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 处理一次构建完成事件
    Notify(NotifyArgs),
    /// 发送任意消息
    Send(SendArgs),
    /// 检查配置
    CheckConfig(CheckConfigArgs),
    /// 查看本地发件箱中最近的消息
    History(HistoryArgs),
}

fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug bnotify notify --event event.json
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("build_notifier=info,bnotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Notify(args) => handle_notify(args, config)?,
        Commands::Send(args) => handle_send(args, config)?,
        Commands::CheckConfig(args) => handle_check_config(args, config)?,
        Commands::History(args) => handle_history(args, config)?,
    }

    Ok(())
}
