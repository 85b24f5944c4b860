//! 消息发件箱 - 本地 JSONL 文件读写

use anyhow::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::channel::Destination;

/// 发件箱记录（JSONL 格式）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// ISO8601 时间戳
    pub ts: DateTime<Utc>,
    pub destination: Destination,
    pub content: String,
}

/// 发件箱文件
#[derive(Debug, Clone)]
pub struct OutboxStore {
    path: PathBuf,
}

impl OutboxStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认路径 `~/.config/build-notifier/outbox.jsonl`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("build-notifier")
            .join("outbox.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加记录（带文件锁）
    pub fn append(&self, record: &OutboxRecord) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;
        let written = writeln!(file, "{}", serde_json::to_string(record)?);
        file.unlock()?;
        written?;

        Ok(())
    }

    /// 读取最近 N 条记录（按时间排序），跳过无法解析的行
    pub fn read_recent(&self, n: usize) -> Vec<OutboxRecord> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let records: Vec<OutboxRecord> = BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let start = records.len().saturating_sub(n);
        let mut recent = records[start..].to_vec();
        recent.sort_by_key(|r| r.ts);
        recent
    }
}
