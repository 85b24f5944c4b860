//! Check-config 命令 - 加载并校验配置

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

use super::output::format_output;
use crate::build::JobInfo;
use crate::config::{NotifierConfig, Transport};
use crate::notification::destination::{is_value_set, resolve_stream, DestinationConfig};

/// Check-config 命令参数
#[derive(Args)]
pub struct CheckConfigArgs {
    /// 同时检查指定 job 的配置，例如 `Folder/TestJob`
    #[arg(long)]
    pub job: Option<String>,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 配置检查结果
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub path: String,
    pub transport: Transport,
    pub stream: Option<String>,
    pub topic: Option<String>,
    pub smart_notify: bool,
    pub personal_notify: bool,
    pub jobs: usize,
    pub problems: Vec<String>,
}

/// 检查配置，返回发现的问题
pub fn check_config(config: &NotifierConfig, job: Option<&JobInfo>) -> Vec<String> {
    let mut problems = Vec::new();

    if config.transport == Transport::Zulip {
        if !is_value_set(Some(config.email.as_str())) {
            problems.push("email is not set".to_string());
        }
        if !is_value_set(Some(config.api_key.as_str())) {
            problems.push("api_key is not set".to_string());
        }
    }

    let run = DestinationConfig::default();
    let global = config.global_destination();
    match job {
        Some(job) => {
            let job_config = config.job_config(job);
            if let Err(e) = resolve_stream(&run, &job_config.destination(), &global) {
                problems.push(format!("job '{}': {}", job.config_key(), e));
            }
        }
        None => {
            // 每个 job 至少要能解析出 stream；没有 job 配置时检查全局
            if config.jobs.is_empty() && !is_value_set(global.stream.as_deref()) {
                problems.push("stream is not set".to_string());
            }
            for (key, job_config) in &config.jobs {
                if let Err(e) = resolve_stream(&run, &job_config.destination(), &global) {
                    problems.push(format!("job '{}': {}", key, e));
                }
            }
        }
    }

    problems
}

/// 处理 check-config 命令
pub fn handle_check_config(args: CheckConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let config = NotifierConfig::load(config_path)?;
    let job = args.job.as_deref().map(JobInfo::from_path);
    let problems = check_config(&config, job.as_ref());

    let report = ConfigReport {
        path: config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(NotifierConfig::default_path)
            .display()
            .to_string(),
        transport: config.transport,
        stream: config.stream.clone(),
        topic: config.topic.clone(),
        smart_notify: config.smart_notify,
        personal_notify: config.personal_notify,
        jobs: config.jobs.len(),
        problems: problems.clone(),
    };

    if args.json {
        println!("{}", format_output(&report));
    } else {
        println!("Config: {}", report.path);
        println!("Transport: {:?}", report.transport);
        println!("Stream: {}", report.stream.as_deref().unwrap_or("-"));
        println!("Topic: {}", report.topic.as_deref().unwrap_or("-"));
        println!("Job overrides: {}", report.jobs);
        for problem in &problems {
            println!("  ✗ {}", problem);
        }
    }

    if !problems.is_empty() {
        bail!("Configuration has {} problem(s)", problems.len());
    }
    if !args.json {
        println!("✓ Configuration OK");
    }
    Ok(())
}
