//! 诊断日志 - 本地 JSONL 文件读写
//!
//! 只用于排查问题，运行时行为从不读取这里的内容。

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

/// 记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Captured,
    Removed,
    Shown,
    Suppressed,
    Cancelled,
    Dismissed,
    LedgerCleared,
}

/// 日志记录（JSONL 格式）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    /// ISO8601 时间戳
    pub ts: DateTime<Utc>,
    pub kind: JournalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// 简短摘要
    #[serde(default)]
    pub summary: String,
}

impl JournalRecord {
    pub fn new(kind: JournalKind) -> Self {
        Self {
            ts: Utc::now(),
            kind,
            logical_id: None,
            package: None,
            summary: String::new(),
        }
    }

    pub fn logical_id(mut self, id: impl Into<String>) -> Self {
        self.logical_id = Some(id.into());
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = truncate_summary(summary, 100);
        self
    }
}

const CLEANUP_CHECK_INTERVAL: usize = 10;
/// 估算行数时假定的平均行长
const AVG_LINE_BYTES: u64 = 120;

/// 诊断日志
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    max_records: usize,
    write_count: AtomicUsize,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            path: path.into(),
            max_records: max_records.max(2),
            write_count: AtomicUsize::new(0),
        }
    }

    /// 默认存储路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notify-relay")
            .join("journal.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加记录（带文件锁）
    pub fn append(&self, record: &JournalRecord) -> Result<()> {
        use fs2::FileExt;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        file.lock_exclusive()?;
        let mut file = file;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        file.unlock()?;

        self.maybe_cleanup();

        Ok(())
    }

    /// 追加记录，失败只记日志
    pub fn record(&self, record: JournalRecord) {
        if let Err(e) = self.append(&record) {
            warn!(path = %self.path.display(), error = %e, "Failed to append journal record");
        }
    }

    /// 读取最近 N 条记录
    pub fn read_recent(&self, n: usize) -> Vec<JournalRecord> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let records: Vec<JournalRecord> = BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let start = records.len().saturating_sub(n);
        let mut recent = records[start..].to_vec();
        recent.sort_by_key(|r| r.ts);
        recent
    }

    fn maybe_cleanup(&self) {
        let count = self.write_count.fetch_add(1, Ordering::Relaxed);
        if count % CLEANUP_CHECK_INTERVAL != 0 {
            return;
        }

        if let Ok(metadata) = fs::metadata(&self.path) {
            let estimated_lines = (metadata.len() / AVG_LINE_BYTES) as usize;
            if estimated_lines > self.max_records {
                if let Err(e) = self.cleanup() {
                    warn!(error = %e, "Journal cleanup failed");
                }
            }
        }
    }

    /// 保留最新的一半记录
    pub fn cleanup(&self) -> Result<()> {
        use fs2::FileExt;

        let file = File::open(&self.path)?;
        file.lock_exclusive()?;

        let records: Vec<String> = BufReader::new(&file)
            .lines()
            .map_while(|line| line.ok())
            .filter(|line| !line.trim().is_empty())
            .collect();

        if records.len() <= self.max_records {
            file.unlock()?;
            return Ok(());
        }

        let keep = self.max_records / 2;
        let start = records.len().saturating_sub(keep);

        let temp_path = self.path.with_extension("tmp");
        {
            let mut temp_file = File::create(&temp_path)?;
            for line in &records[start..] {
                writeln!(temp_file, "{}", line)?;
            }
        }

        fs::rename(&temp_path, &self.path)?;

        file.unlock()?;
        Ok(())
    }
}

enum WriterCommand {
    Record(JournalRecord),
    Flush(std_mpsc::Sender<()>),
}

/// 后台日志写入器
///
/// show 和 posted 回调只把记录入队，加锁追加文件在独立线程上完成。
#[derive(Debug, Clone)]
pub struct JournalWriter {
    tx: UnboundedSender<WriterCommand>,
}

impl JournalWriter {
    /// 启动写入线程，所有发送端释放后线程退出
    pub fn spawn(journal: Journal) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriterCommand>();
        thread::Builder::new()
            .name("journal-writer".to_string())
            .spawn(move || {
                while let Some(command) = rx.blocking_recv() {
                    match command {
                        WriterCommand::Record(record) => journal.record(record),
                        WriterCommand::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                debug!(path = %journal.path().display(), "Journal writer stopped");
            })?;
        Ok(Self { tx })
    }

    /// 入队一条记录，不等待写盘
    pub fn record(&self, record: JournalRecord) {
        if self.tx.send(WriterCommand::Record(record)).is_err() {
            debug!("Journal writer gone, record dropped");
        }
    }

    /// 阻塞到此前入队的记录全部写完
    pub fn flush(&self) {
        let (done_tx, done_rx) = std_mpsc::channel();
        if self.tx.send(WriterCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

/// 截断摘要到指定字符数
fn truncate_summary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
